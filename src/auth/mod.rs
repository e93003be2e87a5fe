pub mod base;
pub mod jwt_provider;
pub mod static_provider;

// Re-export from base.rs so we can do "use crate::auth::*;"
pub use base::{create_auth_provider, AuthProvider, AuthProviderConfig, DRINKS_DETAIL_PERMISSION};
pub use jwt_provider::{JwtAuthProvider, JwtAuthProviderConfig};
pub use static_provider::{StaticAuthProvider, StaticAuthProviderConfig};
