//! AccessGate: decides whether protected work runs or a fallback renders
//!
//! The gate holds injected collaborator handles and nothing else; all
//! per-client state lives in the [`Session`] carried by a [`RenderPass`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use litkit_gate::{AccessGate, GateMode, RecordingSurface, RenderPass, Session};
//! use litkit_gate::auth::DemoIdentity;
//! use litkit_gate::billing::MemoryBilling;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = AccessGate::new()
//!         .with_identity(Arc::new(DemoIdentity::new()))
//!         .with_billing(Arc::new(MemoryBilling::new()));
//!
//!     let mut session = Session::new();
//!     gate.sign_in(&mut session, "a@b.com", "pw").await?;
//!
//!     let mut surface = RecordingSurface::new();
//!     let mut pass = RenderPass::new(&mut session, &mut surface);
//!     let shown = gate.require_authenticated(&mut pass, |_| "private dashboard");
//!     assert!(shown.is_executed());
//!
//!     // Premium section: upsell instead, and stop the page here
//!     let premium = gate
//!         .require_subscription(&mut pass, GateMode::HardStop, |_| "premium")
//!         .await;
//!     assert!(premium.is_halted());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::auth::{IdentityProvider, SocialProvider, UserRecord};
use crate::billing::{BillingProvider, CheckoutRequest, Entitlement, PlanDescriptor};
use crate::billing::types::default_plans;
use crate::error::{Collaborator, ErrorKind, GateError, Result};
use crate::render::RenderPass;
use crate::session::Session;

pub const DEFAULT_UPSELL: &str = "This feature requires a subscription.";

/// What to do when the subscription predicate is false
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Skip the action, keep rendering the page
    Block,
    /// Skip the action and end the render pass
    HardStop,
    /// Run the action anyway, with an upsell beside it
    Advisory,
}

impl GateMode {
    pub fn blocks(&self) -> bool {
        !matches!(self, Self::Advisory)
    }
}

/// Why a gated action did not run
#[derive(Debug)]
pub enum Denial {
    NotAuthenticated,
    NotSubscribed,
    NotConfigured(Collaborator),
    Failed(GateError),
}

/// Outcome of a gated action
#[derive(Debug)]
#[must_use]
pub enum Gated<T> {
    Executed(T),
    Denied(Denial),
    /// The render pass was hard-stopped; nothing further should render
    Halted,
}

impl<T> Gated<T> {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted)
    }

    pub fn executed(self) -> Option<T> {
        match self {
            Self::Executed(v) => Some(v),
            _ => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(d) => Some(d),
            _ => None,
        }
    }
}

impl<T> Gated<Gated<T>> {
    /// Collapse nested gates: the inner action ran only if both allowed it
    pub fn flatten(self) -> Gated<T> {
        match self {
            Self::Executed(inner) => inner,
            Self::Denied(d) => Gated::Denied(d),
            Self::Halted => Gated::Halted,
        }
    }
}

/// Sub-state derived fresh on every subscription check
#[derive(Debug)]
pub enum SubscriptionCheck {
    Active,
    Inactive,
    Unknown(GateError),
}

#[derive(Clone, Default)]
pub struct AccessGate {
    identity: Option<Arc<dyn IdentityProvider>>,
    billing: Option<Arc<dyn BillingProvider>>,
    upsell_message: Option<String>,
}

impl AccessGate {
    /// A gate with no collaborators; every collaborator call is `NotConfigured`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_billing(mut self, billing: Arc<dyn BillingProvider>) -> Self {
        self.billing = Some(billing);
        self
    }

    pub fn with_upsell_message(mut self, message: impl Into<String>) -> Self {
        self.upsell_message = Some(message.into());
        self
    }

    pub fn is_identity_configured(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.is_configured())
    }

    pub fn is_billing_configured(&self) -> bool {
        self.billing.as_ref().is_some_and(|b| b.is_configured())
    }

    fn identity(&self) -> Result<&Arc<dyn IdentityProvider>> {
        self.identity
            .as_ref()
            .filter(|i| i.is_configured())
            .ok_or_else(|| not_configured(Collaborator::Identity))
    }

    fn billing(&self) -> Result<&Arc<dyn BillingProvider>> {
        self.billing
            .as_ref()
            .filter(|b| b.is_configured())
            .ok_or_else(|| not_configured(Collaborator::Billing))
    }

    // ─── Session ───

    pub fn is_authenticated(&self, session: &Session) -> bool {
        session.is_authenticated()
    }

    pub fn current_user<'s>(&self, session: &'s Session) -> Option<&'s UserRecord> {
        session.current_user()
    }

    /// Verify credentials and record the user in the session.
    /// On any error the session is left untouched.
    pub async fn sign_in(&self, session: &mut Session, email: &str, password: &str) -> Result<UserRecord> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(GateError::Validation("Please provide both email and password".into()));
        }
        let identity = self.identity()?;

        match identity.verify_credentials(email, password).await {
            Ok(user) => {
                session.establish(user.clone());
                info!(user_id = %user.id, provider = identity.name(), "Sign in successful");
                Ok(user)
            }
            Err(e) => {
                log_collaborator_failure(identity.name(), "sign in", &e);
                Err(e)
            }
        }
    }

    /// Idempotent; never fails
    pub fn sign_out(&self, session: &mut Session) {
        if let Some(user) = session.current_user() {
            info!(user_id = %user.id, "Signed out");
        }
        session.clear_auth();
    }

    /// Create an account. Does not sign the user in.
    pub async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> Result<UserRecord> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(GateError::Validation("Please provide both email and password".into()));
        }
        if password != confirm {
            return Err(GateError::Validation("Passwords do not match".into()));
        }
        let identity = self.identity()?;

        identity.sign_up(email, password).await.map_err(|e| {
            log_collaborator_failure(identity.name(), "sign up", &e);
            e
        })
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(GateError::Validation("Please provide your email".into()));
        }
        let identity = self.identity()?;

        identity.send_password_reset(email).await.map_err(|e| {
            log_collaborator_failure(identity.name(), "password reset", &e);
            e
        })?;
        info!(provider = identity.name(), "Password reset requested");
        Ok(())
    }

    /// URL starting the OAuth flow for a named provider
    pub fn social_sign_in(&self, provider: &str) -> Result<String> {
        let identity = self.identity()?;
        let provider = SocialProvider::parse(provider)?;
        identity.authorize_url(provider)
    }

    /// Login form submission: renders the outcome, returns whether the
    /// session is now authenticated.
    pub async fn submit_login(&self, pass: &mut RenderPass<'_>, email: &str, password: &str) -> bool {
        match self.sign_in(pass.session_mut(), email, password).await {
            Ok(user) => {
                pass.success(&format!("Signed in as {}", user.email));
                true
            }
            Err(e) => {
                render_failure(pass, &e);
                false
            }
        }
    }

    // ─── Gates ───

    /// Run `action` iff the session is authenticated, otherwise show the
    /// login prompt (or setup instructions when there is no identity
    /// provider to log in with).
    pub fn require_authenticated<'a, T, F>(&self, pass: &mut RenderPass<'a>, action: F) -> Gated<T>
    where
        F: FnOnce(&mut RenderPass<'a>) -> T,
    {
        if pass.is_halted() {
            return Gated::Halted;
        }
        if pass.session().is_authenticated() {
            return Gated::Executed(action(pass));
        }

        debug!("Gate closed: not authenticated");
        if self.is_identity_configured() {
            pass.login_prompt();
            Gated::Denied(Denial::NotAuthenticated)
        } else {
            warn!(collaborator = %Collaborator::Identity, "Collaborator not configured");
            pass.setup_instructions(Collaborator::Identity);
            Gated::Denied(Denial::NotConfigured(Collaborator::Identity))
        }
    }

    /// Gate `action` on `user_id` holding an active subscription.
    ///
    /// The billing provider is queried on every call. Lookup failures are
    /// logged and rendered; in blocking modes they deny, in advisory mode
    /// the action still runs.
    pub async fn require_subscribed<'a, T, F>(
        &self,
        pass: &mut RenderPass<'a>,
        user_id: &str,
        mode: GateMode,
        action: F,
    ) -> Gated<T>
    where
        F: FnOnce(&mut RenderPass<'a>) -> T,
    {
        if pass.is_halted() {
            return Gated::Halted;
        }

        let denial = match self.subscription_status(user_id).await {
            SubscriptionCheck::Active => return Gated::Executed(action(pass)),
            SubscriptionCheck::Inactive => {
                debug!(user_id, ?mode, "Gate closed: no active subscription");
                pass.upsell(self.upsell_message.as_deref().unwrap_or(DEFAULT_UPSELL));
                Denial::NotSubscribed
            }
            SubscriptionCheck::Unknown(e) => {
                render_failure(pass, &e);
                match e {
                    GateError::NotConfigured(c) => Denial::NotConfigured(c),
                    other => Denial::Failed(other),
                }
            }
        };

        match mode {
            GateMode::Advisory => Gated::Executed(action(pass)),
            GateMode::Block => Gated::Denied(denial),
            GateMode::HardStop => {
                pass.halt();
                Gated::Halted
            }
        }
    }

    /// `require_authenticated` and `require_subscribed` for the signed-in user
    pub async fn require_subscription<'a, T, F>(
        &self,
        pass: &mut RenderPass<'a>,
        mode: GateMode,
        action: F,
    ) -> Gated<T>
    where
        F: FnOnce(&mut RenderPass<'a>) -> T,
    {
        let user_id = match self.require_authenticated(pass, |p| p.session().current_user().map(|u| u.id.clone())) {
            Gated::Executed(Some(id)) => id,
            Gated::Executed(None) => return Gated::Denied(Denial::NotAuthenticated),
            Gated::Denied(d) => {
                if mode == GateMode::HardStop {
                    pass.halt();
                    return Gated::Halted;
                }
                return Gated::Denied(d);
            }
            Gated::Halted => return Gated::Halted,
        };
        self.require_subscribed(pass, &user_id, mode, action).await
    }

    /// Fresh entitlement lookup; never cached
    pub async fn subscription_status(&self, user_id: &str) -> SubscriptionCheck {
        let billing = match self.billing() {
            Ok(b) => b,
            Err(e) => return SubscriptionCheck::Unknown(e),
        };

        match billing.fetch_subscription(user_id).await {
            Ok(status) => match status.entitlement_at(Utc::now()) {
                Entitlement::Active => SubscriptionCheck::Active,
                Entitlement::Inactive => SubscriptionCheck::Inactive,
            },
            Err(e) => {
                log_collaborator_failure(billing.name(), "subscription lookup", &e);
                SubscriptionCheck::Unknown(e)
            }
        }
    }

    // ─── Billing ───

    /// Plan catalogue; the stock plans when no billing provider is set
    pub fn list_plans(&self) -> Vec<PlanDescriptor> {
        match &self.billing {
            Some(billing) => billing.list_plans(),
            None => default_plans(None, None),
        }
    }

    /// Start a checkout for the signed-in user; returns the checkout URL
    pub async fn begin_checkout(&self, session: &Session, price_id: Option<&str>) -> Result<String> {
        let billing = self.billing()?;

        let mut request = CheckoutRequest {
            price_id: price_id.map(str::to_string),
            ..CheckoutRequest::default()
        };
        if let Some(user) = session.current_user() {
            request = request.with_customer_email(user.email.clone());
        }

        match billing.create_checkout_session(&request).await {
            Ok(url) => {
                info!(provider = billing.name(), "Checkout session created");
                Ok(url)
            }
            Err(e) => {
                log_collaborator_failure(billing.name(), "checkout", &e);
                Err(e)
            }
        }
    }

    /// Credit balance of the signed-in user
    pub async fn credits(&self, session: &Session) -> Result<i64> {
        let user = session.current_user().ok_or_else(|| {
            GateError::AuthenticationFailed("Please log in to view your credits".into())
        })?;
        let billing = self.billing()?;

        billing.fetch_credits(&user.id).await.map_err(|e| {
            log_collaborator_failure(billing.name(), "credit lookup", &e);
            e
        })
    }
}

fn not_configured(collaborator: Collaborator) -> GateError {
    warn!(%collaborator, "Collaborator not configured");
    GateError::NotConfigured(collaborator)
}

fn log_collaborator_failure(provider: &str, operation: &str, err: &GateError) {
    match err.kind() {
        ErrorKind::Auth | ErrorKind::Validation => {
            warn!(provider, operation, error = %err, "Collaborator rejected request")
        }
        _ => error!(provider, operation, error = %err, "Collaborator call failed"),
    }
}

fn render_failure(pass: &mut RenderPass<'_>, err: &GateError) {
    match err {
        GateError::NotConfigured(c) => pass.setup_instructions(*c),
        other => pass.error(&other.user_message()),
    }
}
