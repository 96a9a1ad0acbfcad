pub mod api_key;
pub mod auth;
pub mod json;
