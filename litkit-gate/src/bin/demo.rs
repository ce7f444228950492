// Text-mode walkthrough of the LitKit private and subscription pages.
// Uses Supabase/Stripe when configured, demo providers otherwise.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use litkit_gate::auth::{DemoIdentity, IdentityProvider, SupabaseIdentity};
use litkit_gate::billing::{BillingProvider, MemoryBilling, StripeBilling};
use litkit_gate::{AccessGate, GateConfig, GateMode, RenderPass, Session, TextSurface};

#[derive(Parser)]
#[command(name = "litkit-gate-demo")]
#[command(version, about = "Render the LitKit gated pages as text", long_about = None)]
struct Cli {
    /// Email to sign in with
    #[arg(long, default_value = "demo@example.com")]
    email: String,

    /// Password to sign in with
    #[arg(long, default_value = "password")]
    password: String,

    /// Skip signing in
    #[arg(long)]
    anonymous: bool,

    /// Seed an active subscription (demo billing only)
    #[arg(long)]
    subscribed: bool,

    /// End the page at the premium section when not subscribed
    #[arg(long)]
    hard_stop: bool,
}

/// `--subscribed` can only seed the in-process billing provider
fn subscribed_flag_ignored(cli: &Cli, demo_billing_in_use: bool) -> bool {
    cli.subscribed && !demo_billing_in_use
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "litkit_gate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = GateConfig::from_env();

    let identity: Arc<dyn IdentityProvider> = if config.identity_status().fully_configured {
        Arc::new(SupabaseIdentity::from_config(&config)?)
    } else {
        warn!("Supabase not configured, using demo identity");
        Arc::new(DemoIdentity::new())
    };

    let demo_billing = Arc::new(
        MemoryBilling::new()
            .with_plans(config.plans.clone())
            .with_checkout(config.checkout.clone()),
    );
    let (billing, seeds_demo_billing): (Arc<dyn BillingProvider>, bool) =
        match StripeBilling::from_config(&config) {
            Ok(stripe) => (Arc::new(stripe) as Arc<dyn BillingProvider>, false),
            Err(_) => {
                warn!("Stripe not configured, using demo billing");
                (demo_billing.clone() as Arc<dyn BillingProvider>, true)
            }
        };
    if subscribed_flag_ignored(&cli, seeds_demo_billing) {
        warn!("--subscribed only applies to demo billing; using the Stripe subscription as is");
    }
    info!(identity = identity.name(), billing = billing.name(), "Providers ready");

    let gate = AccessGate::new()
        .with_identity(identity)
        .with_billing(billing)
        .with_upsell_message("Upgrade to unlock premium features!");

    let mut session = Session::new();
    let mut surface = TextSurface::new(std::io::stdout());
    let mut pass = RenderPass::new(&mut session, &mut surface);

    println!("== Private Page ==");
    let signed_in = !cli.anonymous && gate.submit_login(&mut pass, &cli.email, &cli.password).await;
    if signed_in && cli.subscribed && seeds_demo_billing {
        if let Some(user) = pass.session().current_user() {
            demo_billing.activate(&user.id, None);
        }
    }

    let _ = gate.require_authenticated(&mut pass, |p| {
        if let Some(user) = p.session().current_user() {
            println!("Welcome, {}!", user.display_name);
            println!("  id:    {}", user.id);
            println!("  email: {}", user.email);
        }
    });

    println!();
    println!("== Subscription Page ==");
    let plans = gate.list_plans();
    for plan in &plans {
        let marker = if plan.highlighted { "*" } else { " " };
        println!("{marker} {:<14} {:>14}  {}", plan.name, plan.price(), plan.features.join(", "));
    }

    let _ = gate
        .require_subscription(&mut pass, GateMode::Advisory, |_| {
            println!("Free content: visible to every signed-in user.");
        })
        .await;

    let mode = if cli.hard_stop { GateMode::HardStop } else { GateMode::Block };
    let _ = gate
        .require_subscription(&mut pass, mode, |_| {
            println!("Premium content: thanks for subscribing!");
        })
        .await;

    if pass.is_halted() {
        return Ok(());
    }

    if pass.session().is_authenticated() {
        let price_id = plans.iter().find(|p| p.highlighted).map(|p| p.price_id.as_str());
        match gate.begin_checkout(pass.session(), price_id).await {
            Ok(url) => println!("Checkout: {url}"),
            Err(e) => pass.error(&e.user_message()),
        }
    }
    println!("Thanks for trying LitKit.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribed_flag_needs_demo_billing() {
        let cli = Cli::parse_from(["litkit-gate-demo", "--subscribed"]);
        assert!(subscribed_flag_ignored(&cli, false));
        assert!(!subscribed_flag_ignored(&cli, true));

        let cli = Cli::parse_from(["litkit-gate-demo"]);
        assert!(!subscribed_flag_ignored(&cli, false));
    }
}
