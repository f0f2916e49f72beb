// service/background_jobs.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration};

use crate::{
    db::{productdb::ProductExt, settingsdb::SettingsExt},
    AppState,
};

/// One pass of the expiry sweep. Does nothing when the store has turned
/// automatic deactivation off.
pub async fn deactivate_expired<D>(db_client: &D, now: DateTime<Utc>) -> Result<u64, sqlx::Error>
where
    D: ProductExt + SettingsExt + Sync,
{
    let settings = db_client.get_settings().await?;
    if !settings.auto_deactivate_expired {
        return Ok(0);
    }
    db_client.deactivate_expired_products(now).await
}

/// Hourly job that takes expired products off the shelf.
pub async fn start_product_expiry_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(3600));

    loop {
        interval.tick().await;

        match deactivate_expired(app_state.db_client.as_ref(), Utc::now()).await {
            Ok(0) => tracing::debug!("Product expiry job: nothing to deactivate"),
            Ok(count) => tracing::info!("Product expiry job deactivated {} products", count),
            Err(e) => tracing::error!("Product expiry job failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::{productmodel::ProductStatus, settingsmodel::Settings};

    #[tokio::test]
    async fn expired_products_go_inactive() {
        let store = MemoryStore::new();
        let product = store.insert_product("Cough Syrup", 80.0, 5, false);

        assert_eq!(deactivate_expired(&store, Utc::now()).await.unwrap(), 0);
        assert_eq!(store.product(product.id).unwrap().status, ProductStatus::Active);

        let later = Utc::now() + ChronoDuration::days(400);
        assert_eq!(deactivate_expired(&store, later).await.unwrap(), 1);
        assert_eq!(store.product(product.id).unwrap().status, ProductStatus::Inactive);

        assert_eq!(deactivate_expired(&store, later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_respects_the_setting() {
        let store = MemoryStore::with_settings(Settings {
            auto_deactivate_expired: false,
            ..Settings::default()
        });
        let product = store.insert_product("Cough Syrup", 80.0, 5, false);

        let later = Utc::now() + ChronoDuration::days(400);
        assert_eq!(deactivate_expired(&store, later).await.unwrap(), 0);
        assert_eq!(store.product(product.id).unwrap().status, ProductStatus::Active);
    }
}
