pub mod credentials;
pub mod oauth;

pub use credentials::{first_name_of, GoogleCredentials, UserProfile};
pub use oauth::GoogleOAuth;
