pub mod auth;
pub mod backoffice;
pub mod pastille;
pub mod quiz;
pub mod shared;
pub mod user;
pub mod zone;
