// db/settingsdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::dtos::settingsdtos::UpdateSettingsDto;
use crate::models::settingsmodel::Settings;

#[async_trait]
pub trait SettingsExt {
    /// Returns the settings row, creating it with defaults on first use.
    async fn get_settings(&self) -> Result<Settings, sqlx::Error>;

    async fn update_settings(
        &self,
        changes: &UpdateSettingsDto,
        updated_by: Uuid,
    ) -> Result<Settings, sqlx::Error>;
}

#[async_trait]
impl SettingsExt for DBClient {
    async fn get_settings(&self) -> Result<Settings, sqlx::Error> {
        sqlx::query("INSERT INTO settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, Settings>("SELECT * FROM settings WHERE id = 1")
            .fetch_one(&self.pool)
            .await
    }

    async fn update_settings(
        &self,
        changes: &UpdateSettingsDto,
        updated_by: Uuid,
    ) -> Result<Settings, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&mut *tx)
            .await?;

        let settings = sqlx::query_as::<_, Settings>(
            r#"
            UPDATE settings
            SET store_name = COALESCE($1, store_name),
                store_email = COALESCE($2, store_email),
                store_phone = COALESCE($3, store_phone),
                whatsapp_number = COALESCE($4, whatsapp_number),
                address = COALESCE($5, address),
                tagline = COALESCE($6, tagline),
                low_stock_threshold = COALESCE($7, low_stock_threshold),
                expiring_soon_days = COALESCE($8, expiring_soon_days),
                auto_deactivate_expired = COALESCE($9, auto_deactivate_expired),
                require_rx_approval_before_dispatch = COALESCE($10, require_rx_approval_before_dispatch),
                delivery_enabled = COALESCE($11, delivery_enabled),
                delivery_fee = COALESCE($12, delivery_fee),
                free_delivery_min = COALESCE($13, free_delivery_min),
                mpesa_enabled = COALESCE($14, mpesa_enabled),
                mpesa_short_code = COALESCE($15, mpesa_short_code),
                mpesa_passkey = COALESCE($16, mpesa_passkey),
                mpesa_callback_url = COALESCE($17, mpesa_callback_url),
                payment_notes = COALESCE($18, payment_notes),
                updated_by = $19,
                updated_at = NOW()
            WHERE id = 1
            RETURNING *
            "#,
        )
        .bind(&changes.store_name)
        .bind(&changes.store_email)
        .bind(&changes.store_phone)
        .bind(&changes.whatsapp_number)
        .bind(&changes.address)
        .bind(&changes.tagline)
        .bind(changes.low_stock_threshold)
        .bind(changes.expiring_soon_days)
        .bind(changes.auto_deactivate_expired)
        .bind(changes.require_rx_approval_before_dispatch)
        .bind(changes.delivery_enabled)
        .bind(changes.delivery_fee)
        .bind(changes.free_delivery_min)
        .bind(changes.mpesa_enabled)
        .bind(&changes.mpesa_short_code)
        .bind(&changes.mpesa_passkey)
        .bind(&changes.mpesa_callback_url)
        .bind(&changes.payment_notes)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(settings)
    }
}
