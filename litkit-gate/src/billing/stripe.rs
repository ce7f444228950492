//! Stripe billing: checkout through the Stripe API, subscription state
//! through the Supabase tables that the Stripe webhook keeps current.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{CheckoutSettings, GateConfig, StripeSettings, SupabaseSettings};
use crate::error::{Collaborator, GateError, Result};
use crate::http;

use super::provider::BillingProvider;
use super::types::{CheckoutRequest, PlanDescriptor, SubscriptionState, SubscriptionStatus};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/";

pub struct StripeBilling {
    http: reqwest::Client,
    stripe_base: Url,
    secret_key: String,
    rest_base: Url,
    anon_key: String,
    checkout: CheckoutSettings,
    plans: Vec<PlanDescriptor>,
}

impl StripeBilling {
    pub fn new(
        stripe: &StripeSettings,
        supabase: &SupabaseSettings,
        checkout: CheckoutSettings,
        plans: Vec<PlanDescriptor>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            http: http::client(timeout_secs)?,
            stripe_base: Url::parse(STRIPE_API_BASE)?,
            secret_key: stripe.secret_key.clone(),
            rest_base: http::base_url(&supabase.url)?.join("rest/v1/")?,
            anon_key: supabase.anon_key.clone(),
            checkout,
            plans,
        })
    }

    /// Needs both Stripe (checkout) and Supabase (subscription tables)
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let stripe = config
            .stripe
            .as_ref()
            .ok_or(GateError::NotConfigured(Collaborator::Billing))?;
        let supabase = config
            .supabase
            .as_ref()
            .ok_or(GateError::NotConfigured(Collaborator::Billing))?;
        Self::new(
            stripe,
            supabase,
            config.checkout.clone(),
            config.plans.clone(),
            config.request_timeout_secs,
        )
    }

    /// Point at a different Stripe endpoint (stripe-mock, proxies)
    pub fn with_stripe_base(mut self, base: &str) -> Result<Self> {
        self.stripe_base = http::base_url(base)?;
        Ok(self)
    }

    async fn select_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>> {
        let mut url = self.rest_base.join(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }

        let response = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .map_err(|e| GateError::Billing(format!("subscription store unreachable: {e}")))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GateError::Billing(format!("reading {table}: {e}")))?;

        if !status.is_success() {
            let message = http::error_message(&payload).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(GateError::Billing(message));
        }

        match payload {
            Value::Array(rows) => Ok(rows),
            _ => Err(GateError::Billing(format!("unexpected {table} response shape"))),
        }
    }

    /// Form fields for `POST /v1/checkout/sessions`
    fn checkout_form(&self, request: &CheckoutRequest) -> Result<Vec<(String, String)>> {
        let price_id = request
            .price_id
            .clone()
            .or_else(|| self.checkout.price_id.clone())
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                GateError::Validation(
                    "No Stripe Price ID found. Please set STRIPE_PRICE_ID in your environment variables."
                        .into(),
                )
            })?;
        let success_url = request
            .success_url
            .clone()
            .unwrap_or_else(|| self.checkout.success_url.clone());
        let cancel_url = request
            .cancel_url
            .clone()
            .unwrap_or_else(|| self.checkout.cancel_url.clone());
        if success_url.trim().is_empty() {
            return Err(GateError::Validation(
                "No success URL found. Please set STRIPE_SUCCESS_URL in your environment variables.".into(),
            ));
        }
        if cancel_url.trim().is_empty() {
            return Err(GateError::Validation(
                "No cancel URL found. Please set STRIPE_CANCEL_URL in your environment variables.".into(),
            ));
        }

        let mut form = vec![
            ("line_items[0][price]".to_string(), price_id),
            ("line_items[0][quantity]".to_string(), request.quantity.max(1).to_string()),
            ("mode".to_string(), request.mode.as_str().to_string()),
            ("success_url".to_string(), success_url),
            ("cancel_url".to_string(), cancel_url),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        Ok(form)
    }
}

#[async_trait]
impl BillingProvider for StripeBilling {
    fn name(&self) -> &'static str {
        "stripe"
    }

    fn is_configured(&self) -> bool {
        !self.secret_key.trim().is_empty() && !self.anon_key.trim().is_empty()
    }

    async fn fetch_subscription(&self, user_id: &str) -> Result<SubscriptionStatus> {
        let rows = self
            .select_rows(
                "subscriptions",
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("order", "created_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let status = rows
            .first()
            .map(|row| subscription_from_row(user_id, row))
            .unwrap_or_else(|| SubscriptionStatus::inactive(user_id));
        debug!(user_id, status = %status.status, "Subscription fetched");
        Ok(status)
    }

    fn list_plans(&self) -> Vec<PlanDescriptor> {
        self.plans.clone()
    }

    async fn fetch_credits(&self, user_id: &str) -> Result<i64> {
        let rows = self
            .select_rows(
                "credits",
                &[
                    ("select", "amount".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|r| r.get("amount"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        let form = self.checkout_form(request)?;
        let url = self.stripe_base.join("v1/checkout/sessions")?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| GateError::Checkout(format!("Stripe unreachable: {e}")))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GateError::Checkout(format!("reading Stripe response: {e}")))?;

        if !status.is_success() {
            let message = http::error_message(&payload).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(GateError::Checkout(message));
        }

        payload
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GateError::Checkout("Stripe returned no checkout URL".into()))
    }
}

/// A row whose period end cannot be parsed grants no access
fn subscription_from_row(user_id: &str, row: &Value) -> SubscriptionStatus {
    let mut status = row
        .get("status")
        .and_then(Value::as_str)
        .map(SubscriptionState::from_str)
        .unwrap_or(SubscriptionState::Inactive);

    let period_end = match row.get("current_period_end").and_then(Value::as_str) {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(user_id, error = %e, "Unparseable current_period_end");
                status = SubscriptionState::Inactive;
                None
            }
        },
        None => None,
    };

    SubscriptionStatus {
        user_id: user_id.to_string(),
        status,
        period_end,
    }
}
