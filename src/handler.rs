pub mod auth;
pub mod contact;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod settings;
pub mod uploads;
pub mod users;
