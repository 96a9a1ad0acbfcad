pub mod auth;
pub mod backoffice;
pub mod health;
pub mod pastille;
pub mod quiz;
pub mod user;
pub mod zone;
