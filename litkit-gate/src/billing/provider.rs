//! Billing collaborator contract

use async_trait::async_trait;

use crate::error::Result;

use super::types::{CheckoutRequest, PlanDescriptor, SubscriptionStatus};

/// Tracks subscription and payment state for users.
///
/// A user with no subscription on record is reported as inactive, not as
/// an error.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_subscription(&self, user_id: &str) -> Result<SubscriptionStatus>;

    /// Ordered plan catalogue
    fn list_plans(&self) -> Vec<PlanDescriptor>;

    /// Prepaid credit balance
    async fn fetch_credits(&self, user_id: &str) -> Result<i64>;

    /// Returns the hosted checkout URL
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String>;
}
