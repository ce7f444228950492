//! Identity: user records and the providers that verify credentials
//!
//! Providers are injected into the gate as `Arc<dyn IdentityProvider>`.

pub mod types;
pub mod provider;
pub mod demo;
pub mod memory;

#[cfg(feature = "supabase")]
pub mod supabase;

pub use demo::DemoIdentity;
pub use memory::MemoryIdentity;
pub use provider::IdentityProvider;
pub use types::{SocialProvider, UserRecord};

#[cfg(feature = "supabase")]
pub use supabase::SupabaseIdentity;
