//! In-process billing: subscriptions and a prepaid credit ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::config::CheckoutSettings;
use crate::error::{GateError, Result};

use super::provider::BillingProvider;
use super::types::{default_plans, CheckoutRequest, PlanDescriptor, SubscriptionState, SubscriptionStatus};

/// Cents per credit: one credit per whole currency unit paid
pub const CENTS_PER_CREDIT: i64 = 100;

pub fn credits_for_payment(amount_cents: i64) -> i64 {
    amount_cents.max(0) / CENTS_PER_CREDIT
}

pub struct MemoryBilling {
    subscriptions: DashMap<String, SubscriptionStatus>,
    credits: DashMap<String, i64>,
    plans: Vec<PlanDescriptor>,
    checkout: CheckoutSettings,
}

impl Default for MemoryBilling {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBilling {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
            credits: DashMap::new(),
            plans: default_plans(None, None),
            checkout: CheckoutSettings::default(),
        }
    }

    pub fn with_plans(mut self, plans: Vec<PlanDescriptor>) -> Self {
        self.plans = plans;
        self
    }

    pub fn with_checkout(mut self, checkout: CheckoutSettings) -> Self {
        self.checkout = checkout;
        self
    }

    pub fn set_subscription(&self, status: SubscriptionStatus) {
        info!(user_id = %status.user_id, status = %status.status, "Subscription recorded");
        self.subscriptions.insert(status.user_id.clone(), status);
    }

    pub fn activate(&self, user_id: &str, period_end: Option<DateTime<Utc>>) {
        self.set_subscription(SubscriptionStatus::active(user_id, period_end));
    }

    /// Mark canceled, keeping the period end
    pub fn cancel(&self, user_id: &str) -> bool {
        match self.subscriptions.get_mut(user_id) {
            Some(mut sub) => {
                sub.status = SubscriptionState::Canceled;
                info!(user_id, "Subscription canceled");
                true
            }
            None => false,
        }
    }

    /// Credit a one-time payment; returns the new balance
    pub fn grant_payment_credits(&self, user_id: &str, amount_cents: i64) -> i64 {
        let granted = credits_for_payment(amount_cents);
        let mut balance = self.credits.entry(user_id.to_string()).or_insert(0);
        *balance += granted;
        info!(user_id, granted, balance = *balance, "Credits granted");
        *balance
    }

    /// Debit credits; refuses to overdraw
    pub fn spend_credits(&self, user_id: &str, amount: i64) -> Result<i64> {
        if amount < 0 {
            return Err(GateError::Validation("Credit amount must not be negative".into()));
        }
        let mut balance = self.credits.entry(user_id.to_string()).or_insert(0);
        if *balance < amount {
            return Err(GateError::Billing(format!(
                "Insufficient credits: have {}, need {amount}",
                *balance
            )));
        }
        *balance -= amount;
        Ok(*balance)
    }
}

#[async_trait]
impl BillingProvider for MemoryBilling {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_subscription(&self, user_id: &str) -> Result<SubscriptionStatus> {
        Ok(self
            .subscriptions
            .get(user_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| SubscriptionStatus::inactive(user_id)))
    }

    fn list_plans(&self) -> Vec<PlanDescriptor> {
        self.plans.clone()
    }

    async fn fetch_credits(&self, user_id: &str) -> Result<i64> {
        Ok(self.credits.get(user_id).map(|b| *b).unwrap_or(0))
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        let price_id = request
            .price_id
            .as_deref()
            .or(self.checkout.price_id.as_deref())
            .ok_or_else(|| GateError::Validation("No price selected for checkout".into()))?;
        let success_url = request.success_url.as_deref().unwrap_or(&self.checkout.success_url);

        let mut url = Url::parse(success_url)?;
        url.query_pairs_mut()
            .append_pair("session_id", &format!("cs_demo_{}", Uuid::new_v4().simple()))
            .append_pair("price", price_id);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_conversion() {
        assert_eq!(credits_for_payment(1999), 19);
        assert_eq!(credits_for_payment(99), 0);
        assert_eq!(credits_for_payment(-500), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_inactive() {
        let billing = MemoryBilling::new();
        let sub = billing.fetch_subscription("nobody").await.unwrap();
        assert_eq!(sub.status, SubscriptionState::Inactive);
        assert_eq!(billing.fetch_credits("nobody").await.unwrap(), 0);
    }

    #[test]
    fn test_cancel_keeps_period_end() {
        let billing = MemoryBilling::new();
        let end = Utc::now() + chrono::Duration::days(3);
        billing.activate("u1", Some(end));
        assert!(billing.cancel("u1"));
        assert!(!billing.cancel("u2"));

        let sub = billing.subscriptions.get("u1").unwrap().clone();
        assert_eq!(sub.status, SubscriptionState::Canceled);
        assert_eq!(sub.period_end, Some(end));
    }
}
