use serde::{Deserialize, Serialize};

use crate::models::ordermodel::{OrderStatus, PaymentMethod};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReportQueryDto {
    pub days: Option<String>,
}

impl ReportQueryDto {
    /// Window in days: 7 when absent, otherwise 1..=365.
    pub fn window(&self) -> Result<i64, String> {
        match self.days.as_deref().map(str::trim) {
            None | Some("") => Ok(7),
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=365).contains(days))
                .ok_or_else(|| "days must be between 1 and 365".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCount {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub day: chrono::NaiveDate,
    pub orders: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub qty: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryDto {
    pub days: i64,
    pub total_orders: i64,
    pub paid_orders: i64,
    pub prescription_orders: i64,
    pub revenue: f64,
    pub by_status: Vec<StatusCount>,
    pub by_payment_method: Vec<MethodCount>,
    pub daily: Vec<DailyPoint>,
    pub top_products: Vec<TopProduct>,
}
