//! MemoryBilling integration tests: credits, plans, checkout, entitlement

use chrono::{Duration, Utc};
use url::Url;

use litkit_gate::billing::memory::credits_for_payment;
use litkit_gate::billing::{
    BillingProvider, CheckoutRequest, Entitlement, MemoryBilling, SubscriptionState,
    SubscriptionStatus,
};
use litkit_gate::config::CheckoutSettings;
use litkit_gate::GateError;

#[tokio::test]
async fn test_credit_ledger() {
    let billing = MemoryBilling::new();

    assert_eq!(billing.grant_payment_credits("u1", 999), 9);
    assert_eq!(billing.grant_payment_credits("u1", 1999), 28);
    assert_eq!(billing.fetch_credits("u1").await.unwrap(), 28);

    assert_eq!(billing.spend_credits("u1", 8).unwrap(), 20);
    assert_eq!(billing.fetch_credits("u1").await.unwrap(), 20);
}

#[tokio::test]
async fn test_credit_overdraw_is_refused() {
    let billing = MemoryBilling::new();
    billing.grant_payment_credits("u1", 500);

    let err = billing.spend_credits("u1", 6).unwrap_err();
    assert!(matches!(err, GateError::Billing(ref m) if m.contains("Insufficient credits")));
    assert_eq!(billing.fetch_credits("u1").await.unwrap(), 5);

    assert!(matches!(
        billing.spend_credits("u1", -1),
        Err(GateError::Validation(_))
    ));
    assert!(billing.spend_credits("nobody", 1).is_err());
}

#[test]
fn test_credit_conversion_rounds_down() {
    assert_eq!(credits_for_payment(0), 0);
    assert_eq!(credits_for_payment(100), 1);
    assert_eq!(credits_for_payment(4999), 49);
}

#[test]
fn test_stock_plans() {
    let plans = MemoryBilling::new().list_plans();
    let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Basic", "Professional"]);

    assert_eq!(plans[0].price(), "$9.99/month");
    assert_eq!(plans[1].price(), "$19.99/month");
    assert_eq!(plans.iter().filter(|p| p.highlighted).count(), 1);
    assert!(plans[1].features.len() > plans[0].features.len());
}

#[tokio::test]
async fn test_checkout_url() {
    let billing = MemoryBilling::new();
    let url = billing
        .create_checkout_session(&CheckoutRequest::for_price("price_basic"))
        .await
        .unwrap();

    let parsed = Url::parse(&url).unwrap();
    assert_eq!(parsed.host_str(), Some("localhost"));
    assert_eq!(parsed.port(), Some(8501));
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("price".into(), "price_basic".into())));
    assert!(pairs
        .iter()
        .any(|(k, v)| k == "session_id" && v.starts_with("cs_demo_")));
}

#[tokio::test]
async fn test_checkout_falls_back_to_configured_price() {
    let billing = MemoryBilling::new().with_checkout(CheckoutSettings {
        price_id: Some("price_default".into()),
        success_url: "https://app.example.com/thanks".into(),
        cancel_url: "https://app.example.com/plans".into(),
    });

    let url = billing
        .create_checkout_session(&CheckoutRequest::default())
        .await
        .unwrap();
    assert!(url.starts_with("https://app.example.com/thanks?"));
    assert!(url.contains("price=price_default"));

    let err = MemoryBilling::new()
        .create_checkout_session(&CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::Validation(_)));
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let billing = MemoryBilling::new();
    let now = Utc::now();

    billing.activate("u1", Some(now + Duration::days(30)));
    let sub = billing.fetch_subscription("u1").await.unwrap();
    assert_eq!(sub.entitlement_at(now), Entitlement::Active);
    // Past the period end the same record no longer grants access
    assert_eq!(sub.entitlement_at(now + Duration::days(31)), Entitlement::Inactive);

    billing.cancel("u1");
    let sub = billing.fetch_subscription("u1").await.unwrap();
    assert_eq!(sub.status, SubscriptionState::Canceled);
    assert!(!sub.is_active_at(now));

    billing.set_subscription(SubscriptionStatus::active("u2", None));
    assert!(billing.fetch_subscription("u2").await.unwrap().is_active());
}
