use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ordermodel::*;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineDto {
    pub product: Uuid,

    #[serde(alias = "quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub qty: i32,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ShippingAddressDto {
    #[validate(length(min = 7, message = "A valid phone number is required"))]
    pub phone: String,

    pub county: Option<String>,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,

    pub apartment: Option<String>,

    pub notes: Option<String>,
}

impl From<ShippingAddressDto> for ShippingAddress {
    fn from(dto: ShippingAddressDto) -> Self {
        ShippingAddress {
            phone: dto.phone.trim().to_string(),
            county: dto.county,
            city: dto.city.trim().to_string(),
            street: dto.street.trim().to_string(),
            apartment: dto.apartment,
            notes: dto.notes,
        }
    }
}

/// Checkout request. Any totals the client sends are not part of this
/// shape and are dropped on deserialization.
#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderDto {
    #[validate]
    pub order_items: Vec<OrderLineDto>,

    #[validate]
    pub shipping_address: ShippingAddressDto,

    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDecision {
    Approve,
    Reject,
}

impl OrderDecision {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderDecision::Approve => OrderStatus::Approved,
            OrderDecision::Reject => OrderStatus::Rejected,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OrderDecisionDto {
    pub action: String,
    #[serde(alias = "pharmacistNote")]
    pub note: Option<String>,
}

impl OrderDecisionDto {
    pub fn decision(&self) -> Result<OrderDecision, String> {
        match self.action.trim() {
            "approve" => Ok(OrderDecision::Approve),
            "reject" => Ok(OrderDecision::Reject),
            other => Err(format!("Action must be approve or reject, got '{}'", other)),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OrderStatusDto {
    pub status: String,
}

impl OrderStatusDto {
    /// Only the post-decision states can be set here.
    pub fn target(&self) -> Result<OrderStatus, String> {
        match OrderStatus::parse(self.status.trim()) {
            Some(
                status @ (OrderStatus::Approved | OrderStatus::Dispatched | OrderStatus::Delivered),
            ) => Ok(status),
            _ => Err(format!(
                "Status must be approved, dispatched or delivered, got '{}'",
                self.status
            )),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OrderQueryDto {
    pub status: Option<String>,
}

impl OrderQueryDto {
    pub fn status_filter(&self) -> Result<Option<OrderStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") | Some("All") => Ok(None),
            Some(value) => OrderStatus::parse(value)
                .map(Some)
                .ok_or_else(|| format!("Unknown order status '{}'", value)),
        }
    }
}
