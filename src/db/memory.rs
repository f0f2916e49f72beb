//! In-memory store used by service tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{
    orderdb::OrderExt, paymentdb::PaymentExt, productdb::ProductExt, settingsdb::SettingsExt,
};
use crate::{
    dtos::{
        productdtos::{CreateProductDto, UpdateProductDto},
        settingsdtos::UpdateSettingsDto,
    },
    models::{
        ordermodel::*, paymentmodel::*, productmodel::*, settingsmodel::Settings,
        usermodel::{User, UserRole},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
    settings: Settings,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::default();
        store.tables.lock().unwrap().settings = settings;
        store
    }

    pub fn insert_product(&self, name: &str, price: f64, stock: i32, rx: bool) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            category: "General".to_string(),
            price,
            count_in_stock: stock,
            prescription_required: rx,
            expiry_date: Utc::now() + Duration::days(365),
            status: ProductStatus::Active,
            created_by: Uuid::new_v4(),
            image: String::new(),
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().products.push(product.clone());
        product
    }

    pub fn insert_user(&self, role: UserRole) -> User {
        let user = MemoryStore::user(role);
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn insert_order(&self, order: Order) {
        self.tables.lock().unwrap().orders.push(order);
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.tables
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.tables
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.tables.lock().unwrap().orders.clone()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.tables.lock().unwrap().payments.clone()
    }

    pub fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password: String::new(),
            role,
            profile_pic: String::new(),
            is_blocked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn order_for(user_id: Uuid, total_price: f64) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id,
            order_items: Json(vec![]),
            shipping_address: Json(ShippingAddress::default()),
            payment_method: PaymentMethod::Cod,
            items_price: total_price,
            shipping_price: 0.0,
            total_price,
            requires_prescription: false,
            prescription: Prescription::default(),
            status: OrderStatus::Pending,
            pharmacist_note: String::new(),
            is_paid: false,
            paid_at: None,
            payment_receipt: None,
            delivered_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// Case-insensitive substring match, the same thing ILIKE '%q%' does.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    filter.search.as_deref().map_or(true, |q| {
        contains_ci(&product.name, q)
            || contains_ci(&product.category, q)
            || contains_ci(&product.description, q)
    }) && filter
        .category
        .as_deref()
        .map_or(true, |c| product.category.to_lowercase() == c.to_lowercase())
        && filter.status.map_or(true, |s| product.status == s)
        && filter
            .prescription_required
            .map_or(true, |rx| product.prescription_required == rx)
        && filter.max_stock.map_or(true, |max| product.count_in_stock <= max)
        && filter
            .expires_before
            .map_or(true, |before| product.expiry_date <= before)
}

fn compare_products(a: &Product, b: &Product, sort: ProductSort) -> Ordering {
    match sort {
        ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSort::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
        ProductSort::CountInStock => a.count_in_stock.cmp(&b.count_in_stock),
        ProductSort::ExpiryDate => a.expiry_date.cmp(&b.expiry_date),
        ProductSort::Name => a.name.cmp(&b.name),
    }
}

#[async_trait]
impl ProductExt for MemoryStore {
    async fn get_products(&self, filter: &ProductFilter) -> Result<(Vec<Product>, i64), sqlx::Error> {
        let mut products: Vec<Product> = self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();

        products.sort_by(|a, b| {
            let order = compare_products(a, b, filter.sort);
            let order = if filter.ascending { order } else { order.reverse() };
            order.then_with(|| a.id.cmp(&b.id))
        });

        let total = products.len() as i64;
        let page = products
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        Ok(self.product(product_id))
    }

    async fn get_products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn save_product(&self, _: Uuid, _: &CreateProductDto) -> Result<Product, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }

    async fn update_product(
        &self,
        _: Uuid,
        _: &UpdateProductDto,
    ) -> Result<Option<Product>, sqlx::Error> {
        Ok(None)
    }

    async fn delete_product(&self, _: Uuid) -> Result<u64, sqlx::Error> {
        Ok(0)
    }

    async fn set_product_image(&self, _: Uuid, _: &str) -> Result<Option<Product>, sqlx::Error> {
        Ok(None)
    }

    async fn deactivate_expired_products(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let mut count = 0;
        for product in tables.products.iter_mut() {
            if product.status == ProductStatus::Active && product.expiry_date < now {
                product.status = ProductStatus::Inactive;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl OrderExt for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();

        // Repeated lines for one product draw on the same stock.
        let mut wanted: HashMap<Uuid, i32> = HashMap::new();
        for item in &order.order_items {
            *wanted.entry(item.product).or_insert(0) += item.qty;
        }

        for item in &order.order_items {
            let covered = tables
                .products
                .iter()
                .any(|p| p.id == item.product && p.count_in_stock >= wanted[&item.product]);
            if !covered {
                return Ok(PlacedOrder::OutOfStock {
                    product: item.product,
                    name: item.name.clone(),
                });
            }
        }

        for item in &order.order_items {
            if let Some(product) = tables.products.iter_mut().find(|p| p.id == item.product) {
                product.count_in_stock -= item.qty;
            }
        }

        let saved = Order {
            order_items: Json(order.order_items),
            shipping_address: Json(order.shipping_address),
            payment_method: order.payment_method,
            items_price: order.items_price,
            shipping_price: order.shipping_price,
            total_price: order.total_price,
            requires_prescription: order.requires_prescription,
            ..MemoryStore::order_for(order.user_id, order.total_price)
        };
        tables.orders.push(saved.clone());
        Ok(PlacedOrder::Placed(saved))
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        Ok(self.order(order_id))
    }

    async fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        Ok(self
            .orders()
            .into_iter()
            .filter(|o| o.user_id == user_id)
            .collect())
    }

    async fn get_orders(&self, status: Option<OrderStatus>) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut orders: Vec<OrderDetail> = tables
            .orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .map(|o| {
                let owner = tables.users.iter().find(|u| u.id == o.user_id);
                OrderDetail {
                    order: o.clone(),
                    user_name: owner.map(|u| u.name.clone()),
                    user_email: owner.map(|u| u.email.clone()),
                }
            })
            .collect();
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(orders)
    }

    async fn get_orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, sqlx::Error> {
        Ok(self
            .orders()
            .into_iter()
            .filter(|o| o.created_at >= since)
            .collect())
    }

    async fn decide_order(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(order) = tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.status == OrderStatus::Pending)
        else {
            return Ok(None);
        };

        order.status = status;
        if let Some(note) = note {
            order.pharmacist_note = note;
        }
        let decided = order.clone();

        if status == OrderStatus::Rejected {
            for item in decided.order_items.iter() {
                if let Some(product) = tables.products.iter_mut().find(|p| p.id == item.product) {
                    product.count_in_stock += item.qty;
                }
            }
        }

        Ok(Some(decided))
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.status == from)
            .map(|order| {
                order.status = to;
                if to == OrderStatus::Delivered {
                    order.delivered_at = Some(Utc::now());
                }
                order.clone()
            }))
    }

    async fn attach_prescription(
        &self,
        order_id: Uuid,
        url: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .map(|order| {
                order.prescription = Prescription {
                    url: Some(url.to_string()),
                    uploaded_at: Some(Utc::now()),
                };
                order.clone()
            }))
    }
}

fn settle(payment: &mut Payment, status: PaymentStatus, result: &PaymentResult) {
    payment.status = status;
    payment.mpesa.result_code = Some(result.result_code.clone());
    payment.mpesa.result_desc = Some(result.result_desc.clone());
    if result.receipt.is_some() {
        payment.mpesa.receipt = result.receipt.clone();
    }
    if result.transaction_date.is_some() {
        payment.mpesa.transaction_date = result.transaction_date.clone();
    }
    payment.raw = Json(result.raw.clone());
}

#[async_trait]
impl PaymentExt for MemoryStore {
    async fn save_payment(&self, payment: NewPayment) -> Result<Payment, sqlx::Error> {
        let saved = Payment {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            user_id: payment.user_id,
            provider: "mpesa".to_string(),
            status: PaymentStatus::Pending,
            amount: payment.amount,
            currency: "KES".to_string(),
            phone: payment.phone,
            mpesa: MpesaDetails {
                merchant_request_id: Some(payment.merchant_request_id),
                checkout_request_id: Some(payment.checkout_request_id),
                result_desc: Some(payment.result_desc),
                ..Default::default()
            },
            raw: Json(payment.raw),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().payments.push(saved.clone());
        Ok(saved)
    }

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        Ok(self
            .payments()
            .into_iter()
            .find(|p| p.mpesa.checkout_request_id.as_deref() == Some(checkout_request_id)))
    }

    async fn get_payments(
        &self,
        status: Option<PaymentStatus>,
        search: Option<String>,
    ) -> Result<Vec<PaymentDetail>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut payments: Vec<PaymentDetail> = tables
            .payments
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .filter(|p| {
                search.as_deref().map_or(true, |q| {
                    contains_ci(&p.phone, q)
                        || p.mpesa.receipt.as_deref().map_or(false, |r| contains_ci(r, q))
                        || p
                            .mpesa
                            .checkout_request_id
                            .as_deref()
                            .map_or(false, |c| contains_ci(c, q))
                })
            })
            .map(|p| {
                let order = tables.orders.iter().find(|o| o.id == p.order_id);
                let payer = tables.users.iter().find(|u| u.id == p.user_id);
                PaymentDetail {
                    payment: p.clone(),
                    order_total_price: order.map(|o| o.total_price),
                    order_is_paid: order.map(|o| o.is_paid),
                    order_status: order.map(|o| o.status),
                    user_name: payer.map(|u| u.name.clone()),
                    user_email: payer.map(|u| u.email.clone()),
                }
            })
            .collect();
        payments.sort_by(|a, b| b.payment.created_at.cmp(&a.payment.created_at));
        Ok(payments)
    }

    async fn complete_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(payment) = tables
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id && p.status == PaymentStatus::Pending)
        else {
            return Ok(None);
        };

        settle(payment, PaymentStatus::Success, result);
        let settled = payment.clone();

        if let Some(order) = tables.orders.iter_mut().find(|o| o.id == settled.order_id) {
            order.is_paid = true;
            order.paid_at = order.paid_at.or_else(|| Some(Utc::now()));
            order.payment_method = PaymentMethod::Mpesa;
            if order.payment_receipt.is_none() {
                order.payment_receipt = result.receipt.clone();
            }
        }

        Ok(Some(settled))
    }

    async fn fail_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id && p.status == PaymentStatus::Pending)
            .map(|payment| {
                settle(payment, PaymentStatus::Failed, result);
                payment.clone()
            }))
    }
}

#[async_trait]
impl SettingsExt for MemoryStore {
    async fn get_settings(&self) -> Result<Settings, sqlx::Error> {
        Ok(self.tables.lock().unwrap().settings.clone())
    }

    async fn update_settings(
        &self,
        _: &UpdateSettingsDto,
        _: Uuid,
    ) -> Result<Settings, sqlx::Error> {
        self.get_settings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_payment(order: &Order, phone: &str, checkout: &str) -> NewPayment {
        NewPayment {
            order_id: order.id,
            user_id: order.user_id,
            amount: order.total_price,
            phone: phone.to_string(),
            merchant_request_id: format!("mr-{}", checkout),
            checkout_request_id: checkout.to_string(),
            result_desc: "Success. Request accepted for processing".to_string(),
            raw: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_against_their_sum() {
        let store = MemoryStore::new();
        let p1 = store.insert_product("Cetirizine", 80.0, 5, false);
        let line = OrderItem {
            product: p1.id,
            name: p1.name.clone(),
            price: p1.price,
            qty: 3,
            prescription_required: false,
        };

        let placed = store
            .create_order(NewOrder {
                user_id: Uuid::new_v4(),
                order_items: vec![line.clone(), line],
                shipping_address: ShippingAddress::default(),
                payment_method: PaymentMethod::Cod,
                items_price: 480.0,
                shipping_price: 0.0,
                total_price: 480.0,
                requires_prescription: false,
            })
            .await
            .unwrap();

        assert!(matches!(placed, PlacedOrder::OutOfStock { product, .. } if product == p1.id));
        assert!(store.orders().is_empty());
        assert_eq!(store.product(p1.id).unwrap().count_in_stock, 5);
    }

    #[tokio::test]
    async fn catalog_filter_sort_and_page() {
        let store = MemoryStore::new();
        let cheap = store.insert_product("Vitamin C", 150.0, 40, false);
        let dear = store.insert_product("Insulin Glargine", 3200.0, 3, true);
        let mid = store.insert_product("Ibuprofen", 300.0, 8, false);
        store
            .tables
            .lock()
            .unwrap()
            .products
            .iter_mut()
            .find(|p| p.id == dear.id)
            .unwrap()
            .category = "Diabetes".to_string();

        let by_category = ProductFilter {
            category: Some("diabetes".to_string()),
            ..Default::default()
        };
        let (found, total) = store.get_products(&by_category).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, dear.id);

        let low_stock_otc = ProductFilter {
            prescription_required: Some(false),
            max_stock: Some(10),
            ..Default::default()
        };
        let (found, _) = store.get_products(&low_stock_otc).await.unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![mid.id]);

        let search = ProductFilter {
            search: Some("VITAMIN".to_string()),
            ..Default::default()
        };
        let (found, _) = store.get_products(&search).await.unwrap();
        assert_eq!(found[0].id, cheap.id);

        let second_cheapest = ProductFilter {
            sort: ProductSort::Price,
            ascending: true,
            page: 2,
            limit: 1,
            ..Default::default()
        };
        let (found, total) = store.get_products(&second_cheapest).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mid.id);
    }

    #[tokio::test]
    async fn order_list_filters_by_status_and_joins_the_owner() {
        let store = MemoryStore::new();
        let customer = store.insert_user(UserRole::Customer);
        let older = MemoryStore::order_for(customer.id, 500.0);
        let newer = Order {
            created_at: older.created_at + Duration::minutes(5),
            ..MemoryStore::order_for(customer.id, 700.0)
        };
        let rejected = Order {
            status: OrderStatus::Rejected,
            ..MemoryStore::order_for(customer.id, 900.0)
        };
        store.insert_order(older.clone());
        store.insert_order(newer.clone());
        store.insert_order(rejected);

        let pending = store.get_orders(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(
            pending.iter().map(|o| o.order.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        assert_eq!(pending[0].user_email.as_deref(), Some(customer.email.as_str()));
        assert_eq!(store.get_orders(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn payment_list_filters_by_status_and_search() {
        let store = MemoryStore::new();
        let customer = store.insert_user(UserRole::Customer);
        let order = MemoryStore::order_for(customer.id, 1200.0);
        store.insert_order(order.clone());

        let paid = store
            .save_payment(new_payment(&order, "254712345678", "ws_CO_AAA"))
            .await
            .unwrap();
        store
            .save_payment(new_payment(&order, "254798765432", "ws_CO_BBB"))
            .await
            .unwrap();
        store
            .complete_payment(
                paid.id,
                &PaymentResult {
                    result_code: "0".to_string(),
                    result_desc: "The service request is processed successfully.".to_string(),
                    receipt: Some("NLJ7RT61SV".to_string()),
                    transaction_date: Some("20250101120000".to_string()),
                    raw: serde_json::json!({}),
                },
            )
            .await
            .unwrap();

        let by_receipt = store
            .get_payments(None, Some("nlj7rt".to_string()))
            .await
            .unwrap();
        assert_eq!(by_receipt.len(), 1);
        assert_eq!(by_receipt[0].payment.id, paid.id);
        assert_eq!(by_receipt[0].order_is_paid, Some(true));
        assert_eq!(by_receipt[0].user_name.as_deref(), Some(customer.name.as_str()));

        let by_phone = store
            .get_payments(None, Some("98765".to_string()))
            .await
            .unwrap();
        assert_eq!(by_phone[0].payment.mpesa.checkout_request_id.as_deref(), Some("ws_CO_BBB"));

        let pending = store
            .get_payments(Some(PaymentStatus::Pending), Some("ws_co".to_string()))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].payment.id, paid.id);
    }
}
