pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod token_service;
pub use token_service::{InMemoryTokenService, TokenService};

pub mod privacy_service;
pub mod privacy_service_impl;
pub use privacy_service::{ANONYMIZE_ACTION, BOOTSTRAP_ADMIN_ID, PrivacyError, PrivacyService};
pub use privacy_service_impl::SeaOrmPrivacyService;
