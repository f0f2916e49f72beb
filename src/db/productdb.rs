// db/productdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::{like_pattern, DBClient};
use crate::dtos::productdtos::{CreateProductDto, UpdateProductDto};
use crate::models::productmodel::*;

// Shared WHERE clause for the catalog list and its count. Binds $1..$6.
const PRODUCT_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR name ILIKE $1 OR category ILIKE $1 OR description ILIKE $1)
      AND ($2::text IS NULL OR LOWER(category) = LOWER($2))
      AND ($3::product_status IS NULL OR status = $3)
      AND ($4::boolean IS NULL OR prescription_required = $4)
      AND ($5::integer IS NULL OR count_in_stock <= $5)
      AND ($6::timestamptz IS NULL OR expiry_date <= $6)
"#;

#[async_trait]
pub trait ProductExt {
    async fn get_products(&self, filter: &ProductFilter) -> Result<(Vec<Product>, i64), sqlx::Error>;

    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, sqlx::Error>;

    async fn get_products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error>;

    async fn save_product(
        &self,
        created_by: Uuid,
        product: &CreateProductDto,
    ) -> Result<Product, sqlx::Error>;

    async fn update_product(
        &self,
        product_id: Uuid,
        changes: &UpdateProductDto,
    ) -> Result<Option<Product>, sqlx::Error>;

    async fn delete_product(&self, product_id: Uuid) -> Result<u64, sqlx::Error>;

    /// Sets the cover image and records it in the gallery once.
    async fn set_product_image(
        &self,
        product_id: Uuid,
        url: &str,
    ) -> Result<Option<Product>, sqlx::Error>;

    async fn deactivate_expired_products(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl ProductExt for DBClient {
    async fn get_products(&self, filter: &ProductFilter) -> Result<(Vec<Product>, i64), sqlx::Error> {
        let search = filter.search.as_deref().map(like_pattern);

        let query_str = format!(
            "SELECT * FROM products {} ORDER BY {} {}, id LIMIT $7 OFFSET $8",
            PRODUCT_FILTER,
            filter.sort.column(),
            if filter.ascending { "ASC" } else { "DESC" }
        );

        let items = sqlx::query_as::<_, Product>(&query_str)
            .bind(search.clone())
            .bind(filter.category.clone())
            .bind(filter.status)
            .bind(filter.prescription_required)
            .bind(filter.max_stock)
            .bind(filter.expires_before)
            .bind(filter.limit)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {}", PRODUCT_FILTER))
            .bind(search)
            .bind(filter.category.clone())
            .bind(filter.status)
            .bind(filter.prescription_required)
            .bind(filter.max_stock)
            .bind(filter.expires_before)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(product_ids)
            .fetch_all(&self.pool)
            .await
    }

    async fn save_product(
        &self,
        created_by: Uuid,
        product: &CreateProductDto,
    ) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
            (name, description, category, price, count_in_stock, prescription_required,
             expiry_date, status, created_by, image, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.category.trim())
        .bind(product.price)
        .bind(product.count_in_stock)
        .bind(product.prescription_required)
        .bind(product.expiry_date)
        .bind(product.status.unwrap_or(ProductStatus::Active))
        .bind(created_by)
        .bind(&product.image)
        .bind(&product.images)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_product(
        &self,
        product_id: Uuid,
        changes: &UpdateProductDto,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                count_in_stock = COALESCE($6, count_in_stock),
                prescription_required = COALESCE($7, prescription_required),
                expiry_date = COALESCE($8, expiry_date),
                status = COALESCE($9, status),
                image = COALESCE($10, image),
                images = COALESCE($11, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(&changes.description)
        .bind(changes.category.as_deref().map(str::trim))
        .bind(changes.price)
        .bind(changes.count_in_stock)
        .bind(changes.prescription_required)
        .bind(changes.expiry_date)
        .bind(changes.status)
        .bind(&changes.image)
        .bind(&changes.images)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_product(&self, product_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_product_image(
        &self,
        product_id: Uuid,
        url: &str,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET image = $2,
                images = CASE WHEN $2 = ANY(images) THEN images ELSE array_append(images, $2) END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn deactivate_expired_products(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = 'inactive', updated_at = NOW()
            WHERE status = 'active' AND expiry_date < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
