//! Configuration for the LitKit access gate

use crate::billing::types::{default_plans, PlanDescriptor};

const DEFAULT_RETURN_URL: &str = "http://localhost:8501";

/// Supabase project credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

/// Stripe payment mode; selects which secret key is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Test,
    Live,
}

impl PaymentMode {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "test" => Self::Test,
            _ => Self::Live,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StripeSettings {
    pub secret_key: String,
    pub mode: PaymentMode,
}

// Keep the secret key out of debug logs
impl std::fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

/// Defaults applied to checkout requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub price_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            price_id: None,
            success_url: DEFAULT_RETURN_URL.to_string(),
            cancel_url: DEFAULT_RETURN_URL.to_string(),
        }
    }
}

/// Identity provider configuration status, for setup screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationStatus {
    pub url_configured: bool,
    pub key_configured: bool,
    pub fully_configured: bool,
}

/// Gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Supabase credentials (identity + subscription tables)
    pub supabase: Option<SupabaseSettings>,

    /// Stripe credentials (checkout)
    pub stripe: Option<StripeSettings>,

    /// Checkout defaults
    pub checkout: CheckoutSettings,

    /// Plan catalogue, in display order
    pub plans: Vec<PlanDescriptor>,

    /// Timeout for collaborator HTTP calls, in seconds
    pub request_timeout_secs: u64,

    supabase_url_set: bool,
    supabase_key_set: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfig {
    /// Unconfigured collaborators, stock plans
    pub fn new() -> Self {
        Self {
            supabase: None,
            stripe: None,
            checkout: CheckoutSettings::default(),
            plans: default_plans(None, None),
            request_timeout_secs: 10,
            supabase_url_set: false,
            supabase_key_set: false,
        }
    }

    /// Read configuration from the process environment
    ///
    /// Variables:
    /// ```text
    /// SUPABASE_URL, SUPABASE_KEY
    /// STRIPE_PAYMENT_MODE          test (default) | live
    /// STRIPE_API_KEY_TEST          used in test mode
    /// STRIPE_API_KEY               used in live mode
    /// STRIPE_PRICE_ID, STRIPE_PRO_PRICE_ID
    /// STRIPE_SUCCESS_URL, STRIPE_CANCEL_URL
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup; blank values are absent
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("SUPABASE_URL");
        let key = get("SUPABASE_KEY");
        let supabase_url_set = url.is_some();
        let supabase_key_set = key.is_some();
        let supabase = match (url, key) {
            (Some(url), Some(anon_key)) => Some(SupabaseSettings { url, anon_key }),
            _ => None,
        };

        let mode = PaymentMode::from_str(&get("STRIPE_PAYMENT_MODE").unwrap_or_default());
        let stripe_key = match mode {
            PaymentMode::Test => get("STRIPE_API_KEY_TEST"),
            PaymentMode::Live => get("STRIPE_API_KEY"),
        };
        let stripe = stripe_key.map(|secret_key| StripeSettings { secret_key, mode });

        let price_id = get("STRIPE_PRICE_ID");
        let pro_price_id = get("STRIPE_PRO_PRICE_ID");
        let checkout = CheckoutSettings {
            price_id: price_id.clone(),
            success_url: get("STRIPE_SUCCESS_URL").unwrap_or_else(|| DEFAULT_RETURN_URL.into()),
            cancel_url: get("STRIPE_CANCEL_URL").unwrap_or_else(|| DEFAULT_RETURN_URL.into()),
        };

        Self {
            supabase,
            stripe,
            checkout,
            plans: default_plans(price_id.as_deref(), pro_price_id.as_deref()),
            request_timeout_secs: 10,
            supabase_url_set,
            supabase_key_set,
        }
    }

    /// Override Supabase credentials
    pub fn with_supabase(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.supabase = Some(SupabaseSettings {
            url: url.into(),
            anon_key: anon_key.into(),
        });
        self.supabase_url_set = true;
        self.supabase_key_set = true;
        self
    }

    /// Override Stripe credentials
    pub fn with_stripe_key(mut self, secret_key: impl Into<String>, mode: PaymentMode) -> Self {
        self.stripe = Some(StripeSettings {
            secret_key: secret_key.into(),
            mode,
        });
        self
    }

    /// Override checkout defaults
    pub fn with_checkout(mut self, checkout: CheckoutSettings) -> Self {
        self.checkout = checkout;
        self
    }

    /// Override the plan catalogue
    pub fn with_plans(mut self, plans: Vec<PlanDescriptor>) -> Self {
        self.plans = plans;
        self
    }

    /// Override collaborator timeout
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn identity_status(&self) -> ConfigurationStatus {
        ConfigurationStatus {
            url_configured: self.supabase_url_set,
            key_configured: self.supabase_key_set,
            fully_configured: self.supabase.is_some(),
        }
    }

    pub fn billing_configured(&self) -> bool {
        self.stripe.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = GateConfig::new();
        assert!(cfg.supabase.is_none());
        assert!(!cfg.billing_configured());
        assert_eq!(cfg.checkout.success_url, "http://localhost:8501");
        assert_eq!(cfg.plans.len(), 2);
        assert!(!cfg.identity_status().fully_configured);
    }

    #[test]
    fn test_partial_supabase_is_not_configured() {
        let cfg = GateConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]));
        let status = cfg.identity_status();
        assert!(status.url_configured);
        assert!(!status.key_configured);
        assert!(!status.fully_configured);
    }

    #[test]
    fn test_payment_mode_selects_key() {
        let pairs = [
            ("STRIPE_API_KEY_TEST", "sk_test_1"),
            ("STRIPE_API_KEY", "sk_live_1"),
        ];
        let cfg = GateConfig::from_lookup(lookup(&pairs));
        let stripe = cfg.stripe.unwrap();
        assert_eq!(stripe.mode, PaymentMode::Test);
        assert_eq!(stripe.secret_key, "sk_test_1");

        let pairs = [
            ("STRIPE_PAYMENT_MODE", "live"),
            ("STRIPE_API_KEY_TEST", "sk_test_1"),
            ("STRIPE_API_KEY", "sk_live_1"),
        ];
        let cfg = GateConfig::from_lookup(lookup(&pairs));
        assert_eq!(cfg.stripe.unwrap().secret_key, "sk_live_1");
    }

    #[test]
    fn test_blank_values_are_absent() {
        let cfg = GateConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "  "),
            ("SUPABASE_KEY", "anon"),
            ("STRIPE_API_KEY_TEST", ""),
        ]));
        assert!(!cfg.identity_status().url_configured);
        assert!(cfg.stripe.is_none());
    }

    #[test]
    fn test_price_ids_flow_into_plans() {
        let cfg = GateConfig::from_lookup(lookup(&[
            ("STRIPE_PRICE_ID", "price_basic"),
            ("STRIPE_PRO_PRICE_ID", "price_pro"),
            ("STRIPE_SUCCESS_URL", "https://app.example.com/thanks"),
        ]));
        assert_eq!(cfg.checkout.price_id.as_deref(), Some("price_basic"));
        assert_eq!(cfg.checkout.success_url, "https://app.example.com/thanks");
        assert_eq!(cfg.plans[1].price_id, "price_pro");
    }

    #[test]
    fn test_builder_pattern() {
        let cfg = GateConfig::new()
            .with_supabase("https://x.supabase.co", "anon")
            .with_stripe_key("sk_test_abc", PaymentMode::Test)
            .with_request_timeout_secs(3);

        assert!(cfg.identity_status().fully_configured);
        assert!(cfg.billing_configured());
        assert_eq!(cfg.request_timeout_secs, 3);
        assert!(!format!("{:?}", cfg.stripe).contains("sk_test_abc"));
    }
}
