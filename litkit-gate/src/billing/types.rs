//! Billing domain types: subscription status, plans, checkout requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription state as reported by the billing provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Active,
    Inactive,
    Canceled,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Canceled => "canceled",
        }
    }

    /// Stripe statuses other than `active`/`canceled` (past_due, unpaid,
    /// incomplete, trialing, ...) grant no access.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Inactive,
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective entitlement derived from a status at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub user_id: String,
    pub status: SubscriptionState,
    pub period_end: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    pub fn inactive(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            status: SubscriptionState::Inactive,
            period_end: None,
        }
    }

    pub fn active(user_id: impl Into<String>, period_end: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id: user_id.into(),
            status: SubscriptionState::Active,
            period_end,
        }
    }

    /// Both the stored flag and the period end must agree: an `active`
    /// status whose period already ended is expired.
    pub fn entitlement_at(&self, now: DateTime<Utc>) -> Entitlement {
        if self.status != SubscriptionState::Active {
            return Entitlement::Inactive;
        }
        match self.period_end {
            Some(end) if end <= now => Entitlement::Inactive,
            _ => Entitlement::Active,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.entitlement_at(now) == Entitlement::Active
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

/// A purchasable plan, in catalogue order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price per interval in cents
    pub price_cents: u32,
    pub interval: String,
    pub features: Vec<String>,
    pub price_id: String,
    pub highlighted: bool,
}

impl PlanDescriptor {
    /// Formatted price, e.g. `$9.99/month`
    pub fn price(&self) -> String {
        format!(
            "${}.{:02}/{}",
            self.price_cents / 100,
            self.price_cents % 100,
            self.interval
        )
    }
}

/// The stock LitKit catalogue: Basic and a highlighted Professional plan
pub fn default_plans(basic_price_id: Option<&str>, pro_price_id: Option<&str>) -> Vec<PlanDescriptor> {
    vec![
        PlanDescriptor {
            id: "basic".into(),
            name: "Basic".into(),
            description: "Essential features for individuals".into(),
            price_cents: 999,
            interval: "month".into(),
            features: vec![
                "Access to basic features".into(),
                "Email support".into(),
                "1 project".into(),
            ],
            price_id: basic_price_id.unwrap_or("price_placeholder").to_string(),
            highlighted: false,
        },
        PlanDescriptor {
            id: "pro".into(),
            name: "Professional".into(),
            description: "Advanced features for professionals".into(),
            price_cents: 1999,
            interval: "month".into(),
            features: vec![
                "Access to all features".into(),
                "Priority support".into(),
                "Unlimited projects".into(),
                "Advanced analytics".into(),
            ],
            price_id: pro_price_id.unwrap_or("price_pro_placeholder").to_string(),
            highlighted: true,
        },
    ]
}

/// Stripe Checkout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    Subscription,
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Payment => "payment",
        }
    }
}

/// Checkout parameters; unset fields fall back to the provider's settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: Option<String>,
    pub customer_email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub quantity: u32,
    pub mode: CheckoutMode,
}

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self {
            price_id: None,
            customer_email: None,
            success_url: None,
            cancel_url: None,
            quantity: 1,
            mode: CheckoutMode::Subscription,
        }
    }
}

impl CheckoutRequest {
    pub fn for_price(price_id: impl Into<String>) -> Self {
        Self {
            price_id: Some(price_id.into()),
            ..Self::default()
        }
    }

    pub fn with_customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_mode(mut self, mode: CheckoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}
