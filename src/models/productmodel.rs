use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "product_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<ProductStatus> {
        match value {
            "active" => Some(ProductStatus::Active),
            "inactive" => Some(ProductStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub count_in_stock: i32,
    pub prescription_required: bool,
    pub expiry_date: DateTime<Utc>,
    pub status: ProductStatus,
    pub created_by: Uuid,
    pub image: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns a product listing may be ordered by, keyed by the public name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    CreatedAt,
    Price,
    CountInStock,
    ExpiryDate,
    Name,
}

impl ProductSort {
    pub fn parse(value: &str) -> Option<ProductSort> {
        match value {
            "createdAt" => Some(ProductSort::CreatedAt),
            "price" => Some(ProductSort::Price),
            "countInStock" => Some(ProductSort::CountInStock),
            "expiryDate" => Some(ProductSort::ExpiryDate),
            "name" => Some(ProductSort::Name),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ProductSort::CreatedAt => "created_at",
            ProductSort::Price => "price",
            ProductSort::CountInStock => "count_in_stock",
            ProductSort::ExpiryDate => "expiry_date",
            ProductSort::Name => "name",
        }
    }
}

/// A validated catalog query, ready to be turned into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub prescription_required: Option<bool>,
    pub max_stock: Option<i32>,
    pub expires_before: Option<DateTime<Utc>>,
    pub sort: ProductSort,
    pub ascending: bool,
    pub page: i64,
    pub limit: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            search: None,
            category: None,
            status: None,
            prescription_required: None,
            max_stock: None,
            expires_before: None,
            sort: ProductSort::CreatedAt,
            ascending: false,
            page: 1,
            limit: 10,
        }
    }
}

/// Highest page a catalog query may ask for.
pub const MAX_PAGE: i64 = 100_000;

impl ProductFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
