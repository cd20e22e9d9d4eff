pub mod accounts;
pub mod auth;
pub mod engagement;
pub mod identity;
pub mod listing;
pub mod media;
pub mod reports;
pub mod scoring;
