use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::productmodel::*;

/// Catalog query string. Everything arrives as text and is checked in
/// `into_filter` so a bad value becomes a 400 instead of a rejection.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQueryDto {
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub prescription: Option<String>,
    pub low_stock: Option<String>,
    pub expiring_days: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("{} must be true or false", name)),
    }
}

impl ProductQueryDto {
    pub fn into_filter(
        self,
        low_stock_threshold: i32,
        now: DateTime<Utc>,
    ) -> Result<ProductFilter, String> {
        let mut filter = ProductFilter::default();

        filter.search = non_empty(&self.q).map(str::to_string);
        filter.category = non_empty(&self.category).map(str::to_string);

        if let Some(status) = non_empty(&self.status) {
            filter.status = Some(
                ProductStatus::parse(status)
                    .ok_or_else(|| format!("Invalid status '{}'", status))?,
            );
        }

        if let Some(prescription) = non_empty(&self.prescription) {
            filter.prescription_required = Some(parse_bool("prescription", prescription)?);
        }

        if let Some(low_stock) = non_empty(&self.low_stock) {
            if parse_bool("lowStock", low_stock)? {
                filter.max_stock = Some(low_stock_threshold);
            }
        }

        if let Some(days) = non_empty(&self.expiring_days) {
            let days = days
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 1)
                .ok_or_else(|| "expiringDays must be a number of at least 1".to_string())?;
            filter.expires_before = Some(now + Duration::days(days));
        }

        if let Some(page) = non_empty(&self.page) {
            filter.page = page
                .parse::<i64>()
                .map_err(|_| "page must be a number".to_string())?
                .max(1);
            if filter.page > MAX_PAGE {
                return Err(format!("page must not be greater than {}", MAX_PAGE));
            }
        }

        if let Some(limit) = non_empty(&self.limit) {
            filter.limit = limit
                .parse::<i64>()
                .map_err(|_| "limit must be a number".to_string())?
                .clamp(1, 50);
        }

        if let Some(sort_by) = non_empty(&self.sort_by) {
            filter.sort = ProductSort::parse(sort_by)
                .ok_or_else(|| format!("Cannot sort by '{}'", sort_by))?;
        }

        filter.ascending = match non_empty(&self.sort_dir) {
            None | Some("desc") => false,
            Some("asc") => true,
            Some(other) => return Err(format!("sortDir must be asc or desc, got '{}'", other)),
        };

        Ok(filter)
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductDto {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub count_in_stock: i32,

    #[serde(default)]
    pub prescription_required: bool,

    pub expiry_date: DateTime<Utc>,

    pub status: Option<ProductStatus>,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDto {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub count_in_stock: Option<i32>,

    pub prescription_required: Option<bool>,

    pub expiry_date: Option<DateTime<Utc>>,

    pub status: Option<ProductStatus>,

    pub image: Option<String>,

    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductPageDto {
    pub items: Vec<Product>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl ProductPageDto {
    pub fn new(items: Vec<Product>, filter: &ProductFilter, total: i64) -> Self {
        ProductPageDto {
            items,
            page: filter.page,
            limit: filter.limit,
            total,
            pages: (total + filter.limit - 1) / filter.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ProductQueryDto {
        let value: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(value)).unwrap()
    }

    #[test]
    fn defaults_when_nothing_given() {
        let filter = ProductQueryDto::default().into_filter(5, Utc::now()).unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn parses_every_filter() {
        let now = Utc::now();
        let filter = query(&[
            ("q", " amox "),
            ("category", "Antibiotics"),
            ("status", "active"),
            ("prescription", "true"),
            ("lowStock", "true"),
            ("expiringDays", "30"),
            ("page", "3"),
            ("limit", "500"),
            ("sortBy", "price"),
            ("sortDir", "asc"),
        ])
        .into_filter(7, now)
        .unwrap();

        assert_eq!(filter.search.as_deref(), Some("amox"));
        assert_eq!(filter.category.as_deref(), Some("Antibiotics"));
        assert_eq!(filter.status, Some(ProductStatus::Active));
        assert_eq!(filter.prescription_required, Some(true));
        assert_eq!(filter.max_stock, Some(7));
        assert_eq!(filter.expires_before, Some(now + Duration::days(30)));
        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.offset(), 100);
        assert_eq!(filter.sort, ProductSort::Price);
        assert!(filter.ascending);
    }

    #[test]
    fn rejects_bad_values() {
        let now = Utc::now();
        for pairs in [
            [("status", "archived")],
            [("prescription", "yes")],
            [("expiringDays", "0")],
            [("expiringDays", "soon")],
            [("page", "two")],
            [("page", "9223372036854775807")],
            [("page", "100001")],
            [("limit", "ten")],
            [("sortBy", "password")],
            [("sortDir", "sideways")],
        ] {
            assert!(
                query(&pairs).into_filter(5, now).is_err(),
                "{:?} should be rejected",
                pairs
            );
        }
    }

    #[test]
    fn limit_has_a_floor_of_one() {
        let filter = query(&[("limit", "0"), ("page", "-4")])
            .into_filter(5, Utc::now())
            .unwrap();
        assert_eq!(filter.limit, 1);
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn last_allowed_page_has_a_finite_offset() {
        let filter = query(&[("page", "100000"), ("limit", "50")])
            .into_filter(5, Utc::now())
            .unwrap();
        assert_eq!(filter.page, MAX_PAGE);
        assert_eq!(filter.offset(), (MAX_PAGE - 1) * 50);
    }

    #[test]
    fn low_stock_false_is_no_filter() {
        let filter = query(&[("lowStock", "false")])
            .into_filter(5, Utc::now())
            .unwrap();
        assert_eq!(filter.max_stock, None);
    }

    #[test]
    fn page_count_rounds_up() {
        let filter = ProductFilter {
            limit: 10,
            ..ProductFilter::default()
        };
        assert_eq!(ProductPageDto::new(vec![], &filter, 21).pages, 3);
        assert_eq!(ProductPageDto::new(vec![], &filter, 0).pages, 0);
    }

    #[test]
    fn create_rejects_negative_price() {
        let dto = CreateProductDto {
            name: "Paracetamol".to_string(),
            description: String::new(),
            category: "Pain".to_string(),
            price: -1.0,
            count_in_stock: 4,
            prescription_required: false,
            expiry_date: Utc::now(),
            status: None,
            image: String::new(),
            images: vec![],
        };
        assert!(dto.validate().is_err());
    }
}
