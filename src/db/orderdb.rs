// db/orderdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ordermodel::*;

#[async_trait]
pub trait OrderExt {
    /// Inserts the order and takes its quantities out of stock in one
    /// transaction. Nothing is written when any line can't be covered.
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, sqlx::Error>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error>;

    async fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error>;

    async fn get_orders(&self, status: Option<OrderStatus>) -> Result<Vec<OrderDetail>, sqlx::Error>;

    async fn get_orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, sqlx::Error>;

    /// Moves a pending order to approved or rejected. A rejection puts the
    /// reserved quantities back. `None` when the order was no longer pending.
    async fn decide_order(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Option<Order>, sqlx::Error>;

    /// Compare-and-set on the status column. `None` when `from` no longer holds.
    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error>;

    async fn attach_prescription(
        &self,
        order_id: Uuid,
        url: &str,
    ) -> Result<Option<Order>, sqlx::Error>;
}

#[async_trait]
impl OrderExt for DBClient {
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for item in &order.order_items {
            let reserved = sqlx::query(
                r#"
                UPDATE products
                SET count_in_stock = count_in_stock - $2, updated_at = NOW()
                WHERE id = $1 AND count_in_stock >= $2
                "#,
            )
            .bind(item.product)
            .bind(item.qty)
            .execute(&mut *tx)
            .await?;

            if reserved.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(PlacedOrder::OutOfStock {
                    product: item.product,
                    name: item.name.clone(),
                });
            }
        }

        let saved = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
            (user_id, order_items, shipping_address, payment_method,
             items_price, shipping_price, total_price, requires_prescription)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(order.user_id)
        .bind(Json(order.order_items))
        .bind(Json(order.shipping_address))
        .bind(order.payment_method)
        .bind(order.items_price)
        .bind(order.shipping_price)
        .bind(order.total_price)
        .bind(order.requires_prescription)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PlacedOrder::Placed(saved))
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_orders(&self, status: Option<OrderStatus>) -> Result<Vec<OrderDetail>, sqlx::Error> {
        sqlx::query_as::<_, OrderDetail>(
            r#"
            SELECT o.*, u.name AS user_name, u.email AS user_email
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            WHERE ($1::order_status IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE created_at >= $1 ORDER BY created_at ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    async fn decide_order(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let decided = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2,
                pharmacist_note = COALESCE($3, pharmacist_note),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(note)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = decided else {
            tx.rollback().await?;
            return Ok(None);
        };

        if status == OrderStatus::Rejected {
            for item in order.order_items.iter() {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET count_in_stock = count_in_stock + $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(item.product)
                .bind(item.qty)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $3,
                delivered_at = CASE WHEN $3 = 'delivered'::order_status THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn attach_prescription(
        &self,
        order_id: Uuid,
        url: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET prescription_url = $2,
                prescription_uploaded_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
    }
}
