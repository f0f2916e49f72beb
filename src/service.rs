pub mod background_jobs;
pub mod error;
pub mod media;
pub mod mpesa;
pub mod order_service;
pub mod payment_service;
pub mod report_service;
