pub mod contactmodel;
pub mod ordermodel;
pub mod paymentmodel;
pub mod productmodel;
pub mod settingsmodel;
pub mod usermodel;
