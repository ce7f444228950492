//! # LitKit Gate
//!
//! Session-scoped access control for LitKit apps. Sign-in, subscription
//! checks and fallback UI, with the identity provider (Supabase Auth) and
//! the billing provider (Stripe) injected as client handles.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │               page render                 │
//! │      RenderPass = &mut Session + surface  │
//! ├───────────────────────────────────────────┤
//! │               AccessGate                  │
//! │  require_authenticated / require_subscribed│
//! │  sign_in / sign_out / checkout            │
//! ├─────────────────────┬─────────────────────┤
//! │  IdentityProvider   │   BillingProvider   │
//! │  Supabase | Memory  │   Stripe | Memory   │
//! │  | Demo             │                     │
//! └─────────────────────┴─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use litkit_gate::{AccessGate, GateConfig, RenderPass, Session, TextSurface};
//! use litkit_gate::auth::SupabaseIdentity;
//! use litkit_gate::billing::StripeBilling;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GateConfig::from_env();
//!     let gate = AccessGate::new()
//!         .with_identity(Arc::new(SupabaseIdentity::from_config(&config)?))
//!         .with_billing(Arc::new(StripeBilling::from_config(&config)?));
//!
//!     let mut session = Session::new();
//!     let mut surface = TextSurface::new(std::io::stdout());
//!     let mut pass = RenderPass::new(&mut session, &mut surface);
//!
//!     let _ = gate.require_authenticated(&mut pass, |_| println!("private content"));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Default-closed**: a session without auth keys is anonymous
//! - **Composable gates**: nested gates run the action only if all allow it
//! - **Hard stops**: a blocked render pass suppresses all later output
//! - **Distinct setup errors**: `NotConfigured` is never confused with a
//!   rejected login or a missing subscription
//! - **Railway Programming**: all fallible operations return `Result<T, GateError>`

pub mod config;
pub mod error;
pub mod session;
pub mod render;
pub mod gate;
pub mod auth;
pub mod billing;

#[cfg(any(feature = "supabase", feature = "stripe"))]
mod http;

// Re-exports for convenience
pub use config::{GateConfig, PaymentMode};
pub use error::{Collaborator, ErrorKind, GateError, Result};
pub use gate::{AccessGate, Denial, GateMode, Gated, SubscriptionCheck};
pub use render::{RecordingSurface, RenderPass, RenderSurface, Rendered, TextSurface};
pub use session::{Session, SessionPhase};

pub use auth::{IdentityProvider, UserRecord};
pub use billing::{BillingProvider, PlanDescriptor, SubscriptionStatus};
