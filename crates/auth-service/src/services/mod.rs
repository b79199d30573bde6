pub mod notifier;
pub mod registration_service;
pub mod session_service;
pub mod token_service;

pub use notifier::{HttpNotifier, NotificationDispatcher};
pub use registration_service::RegistrationService;
pub use session_service::SessionService;
pub use token_service::TokenIssuer;
