// db/paymentdb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::db::{like_pattern, DBClient};
use crate::models::paymentmodel::*;

#[async_trait]
pub trait PaymentExt {
    async fn save_payment(&self, payment: NewPayment) -> Result<Payment, sqlx::Error>;

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payments(
        &self,
        status: Option<PaymentStatus>,
        search: Option<String>,
    ) -> Result<Vec<PaymentDetail>, sqlx::Error>;

    /// Marks a pending payment successful and its order paid, atomically.
    /// `None` when the payment had already left `pending`. An order that was
    /// already paid keeps its first receipt and paid_at.
    async fn complete_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn fail_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error>;
}

const SETTLE_PAYMENT: &str = r#"
    UPDATE payments
    SET status = $2,
        result_code = $3,
        result_desc = $4,
        receipt = COALESCE($5, receipt),
        transaction_date = COALESCE($6, transaction_date),
        raw = $7,
        updated_at = NOW()
    WHERE id = $1 AND status = 'pending'
    RETURNING *
"#;

#[async_trait]
impl PaymentExt for DBClient {
    async fn save_payment(&self, payment: NewPayment) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
            (order_id, user_id, provider, status, amount, currency, phone,
             merchant_request_id, checkout_request_id, result_desc, raw)
            VALUES ($1, $2, 'mpesa', 'pending', $3, 'KES', $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payment.order_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.phone)
        .bind(payment.merchant_request_id)
        .bind(payment.checkout_request_id)
        .bind(payment.result_desc)
        .bind(Json(payment.raw))
        .fetch_one(&self.pool)
        .await
    }

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE checkout_request_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payments(
        &self,
        status: Option<PaymentStatus>,
        search: Option<String>,
    ) -> Result<Vec<PaymentDetail>, sqlx::Error> {
        sqlx::query_as::<_, PaymentDetail>(
            r#"
            SELECT p.*,
                   o.total_price AS order_total_price,
                   o.is_paid AS order_is_paid,
                   o.status AS order_status,
                   u.name AS user_name,
                   u.email AS user_email
            FROM payments p
            LEFT JOIN orders o ON o.id = p.order_id
            LEFT JOIN users u ON u.id = p.user_id
            WHERE ($1::payment_status IS NULL OR p.status = $1)
              AND ($2::text IS NULL
                   OR p.phone ILIKE $2
                   OR p.receipt ILIKE $2
                   OR p.checkout_request_id ILIKE $2)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(status)
        .bind(search.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await
    }

    async fn complete_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let settled = sqlx::query_as::<_, Payment>(SETTLE_PAYMENT)
            .bind(payment_id)
            .bind(PaymentStatus::Success)
            .bind(&result.result_code)
            .bind(&result.result_desc)
            .bind(&result.receipt)
            .bind(&result.transaction_date)
            .bind(Json(result.raw.clone()))
            .fetch_optional(&mut *tx)
            .await?;

        let Some(payment) = settled else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE orders
            SET is_paid = TRUE,
                paid_at = COALESCE(paid_at, NOW()),
                payment_method = 'mpesa',
                payment_receipt = COALESCE(payment_receipt, $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment.order_id)
        .bind(&result.receipt)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(payment))
    }

    async fn fail_payment(
        &self,
        payment_id: Uuid,
        result: &PaymentResult,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(SETTLE_PAYMENT)
            .bind(payment_id)
            .bind(PaymentStatus::Failed)
            .bind(&result.result_code)
            .bind(&result.result_desc)
            .bind(&result.receipt)
            .bind(&result.transaction_date)
            .bind(Json(result.raw.clone()))
            .fetch_optional(&self.pool)
            .await
    }
}
