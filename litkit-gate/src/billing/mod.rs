//! Billing: subscription state, plans, checkout, credits

pub mod types;
pub mod provider;
pub mod memory;

#[cfg(feature = "stripe")]
pub mod stripe;

pub use memory::MemoryBilling;
pub use provider::BillingProvider;
pub use types::{
    CheckoutMode, CheckoutRequest, Entitlement, PlanDescriptor, SubscriptionState,
    SubscriptionStatus,
};

#[cfg(feature = "stripe")]
pub use stripe::StripeBilling;
