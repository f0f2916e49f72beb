// db/contactdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::dtos::contactdtos::CreateContactDto;
use crate::models::contactmodel::*;

#[async_trait]
pub trait ContactExt {
    async fn save_contact_message(
        &self,
        message: &CreateContactDto,
    ) -> Result<ContactMessage, sqlx::Error>;

    async fn get_contact_messages(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<ContactMessage>, sqlx::Error>;

    async fn update_contact_status(
        &self,
        message_id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<ContactMessage>, sqlx::Error>;
}

#[async_trait]
impl ContactExt for DBClient {
    async fn save_contact_message(
        &self,
        message: &CreateContactDto,
    ) -> Result<ContactMessage, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (name, email, phone, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(message.name.trim())
        .bind(message.email.trim())
        .bind(message.phone.trim())
        .bind(message.subject.trim())
        .bind(message.message.trim())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_contact_messages(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<ContactMessage>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT * FROM contact_messages
            WHERE ($1::contact_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_contact_status(
        &self,
        message_id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<ContactMessage>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            UPDATE contact_messages
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(message_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }
}
