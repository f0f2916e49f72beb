use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{orderdb::OrderExt, productdb::ProductExt, settingsdb::SettingsExt},
    dtos::orderdtos::*,
    models::{
        ordermodel::*,
        productmodel::Product,
        settingsmodel::Settings,
        usermodel::User,
    },
    service::error::ServiceError,
};

/// Turns a checkout request into a priced order using current catalog data.
/// Prices, names and prescription flags come from `products`, never from the client.
pub fn price_order(
    user_id: Uuid,
    dto: &CreateOrderDto,
    products: &[Product],
    settings: &Settings,
) -> Result<NewOrder, ServiceError> {
    if dto.order_items.is_empty() {
        return Err(ServiceError::Validation("No order items".to_string()));
    }

    let catalog: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut wanted: HashMap<Uuid, i32> = HashMap::new();
    for line in &dto.order_items {
        *wanted.entry(line.product).or_insert(0) += line.qty;
    }

    let mut order_items = Vec::with_capacity(dto.order_items.len());
    for line in &dto.order_items {
        let product = catalog
            .get(&line.product)
            .ok_or(ServiceError::ProductNotFound(line.product))?;

        if product.count_in_stock < wanted[&line.product] {
            return Err(ServiceError::InsufficientStock {
                name: product.name.clone(),
                available: product.count_in_stock,
            });
        }

        order_items.push(OrderItem {
            product: product.id,
            name: product.name.clone(),
            price: product.price,
            qty: line.qty,
            prescription_required: product.prescription_required,
        });
    }

    let items_price: f64 = order_items.iter().map(OrderItem::line_total).sum();
    let shipping_price = settings.shipping_price_for(items_price);

    Ok(NewOrder {
        user_id,
        requires_prescription: order_items.iter().any(|item| item.prescription_required),
        order_items,
        shipping_address: dto.shipping_address.clone().into(),
        payment_method: dto.payment_method.unwrap_or_default(),
        items_price,
        shipping_price,
        total_price: items_price + shipping_price,
    })
}

pub struct OrderService<D> {
    db_client: Arc<D>,
}

impl<D> OrderService<D>
where
    D: ProductExt + OrderExt + SettingsExt + Send + Sync,
{
    pub fn new(db_client: Arc<D>) -> Self {
        Self { db_client }
    }

    pub async fn place_order(
        &self,
        user_id: Uuid,
        dto: CreateOrderDto,
    ) -> Result<Order, ServiceError> {
        let ids: Vec<Uuid> = dto.order_items.iter().map(|line| line.product).collect();
        let products = self.db_client.get_products_by_ids(&ids).await?;
        let settings = self.db_client.get_settings().await?;

        let new_order = price_order(user_id, &dto, &products, &settings)?;

        // Stock may have moved since the read above; the write re-checks it.
        match self.db_client.create_order(new_order).await? {
            PlacedOrder::Placed(order) => {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %user_id,
                    total = order.total_price,
                    "order placed"
                );
                Ok(order)
            }
            PlacedOrder::OutOfStock { product, name } => {
                let available = products
                    .iter()
                    .find(|p| p.id == product)
                    .map(|p| p.count_in_stock)
                    .unwrap_or(0);
                Err(ServiceError::InsufficientStock { name, available })
            }
        }
    }

    /// Owners see their own orders; staff see every order.
    pub async fn get_order_for(&self, user: &User, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self
            .db_client
            .get_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        if order.user_id != user.id && !user.role.is_staff() {
            return Err(ServiceError::OrderAccessDenied(order_id));
        }

        Ok(order)
    }

    pub async fn decide(
        &self,
        order_id: Uuid,
        decision: OrderDecision,
        note: Option<String>,
    ) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        let target = decision.target();

        if !order.status.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        if target == OrderStatus::Approved {
            self.ensure_prescription(&order).await?;
        }

        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let decided = self
            .db_client
            .decide_order(order_id, target, note)
            .await?
            .ok_or(ServiceError::InvalidTransition {
                from: order.status,
                to: target,
            })?;

        tracing::info!(order_id = %order_id, status = decided.status.to_str(), "order decided");
        Ok(decided)
    }

    pub async fn advance_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;

        if !order.status.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        if target == OrderStatus::Approved {
            self.ensure_prescription(&order).await?;
        }

        let updated = self
            .db_client
            .update_order_status(order_id, order.status, target)
            .await?
            .ok_or(ServiceError::InvalidTransition {
                from: order.status,
                to: target,
            })?;

        tracing::info!(order_id = %order_id, status = updated.status.to_str(), "order status changed");
        Ok(updated)
    }

    /// Only the customer who placed the order may attach its prescription.
    pub async fn attach_prescription(
        &self,
        user: &User,
        order_id: Uuid,
        url: &str,
    ) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        if order.user_id != user.id {
            return Err(ServiceError::OrderAccessDenied(order_id));
        }

        self.db_client
            .attach_prescription(order_id, url)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.db_client
            .get_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    async fn ensure_prescription(&self, order: &Order) -> Result<(), ServiceError> {
        if !order.requires_prescription || order.prescription.is_uploaded() {
            return Ok(());
        }

        let settings = self.db_client.get_settings().await?;
        if settings.require_rx_approval_before_dispatch {
            return Err(ServiceError::PrescriptionMissing(order.id));
        }
        Ok(())
    }
}
