pub mod contactdb;
pub mod db;
pub mod orderdb;
pub mod paymentdb;
pub mod productdb;
pub mod settingsdb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

pub use db::DBClient;
