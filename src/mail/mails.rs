use super::sendmail::{MailError, Mailer};
use crate::models::contactmodel::ContactMessage;

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn contact_subject(message: &ContactMessage) -> String {
    if message.subject.is_empty() {
        format!("New contact message from {}", message.name)
    } else {
        message.subject.clone()
    }
}

pub fn contact_body(message: &ContactMessage) -> String {
    format!(
        "New Contact Message\n\nName: {}\nEmail: {}\nPhone: {}\nSubject: {}\n\nMessage:\n{}\n",
        message.name,
        message.email,
        or_na(&message.phone),
        or_na(&message.subject),
        message.message
    )
}

/// Forwards a storefront contact message to the store admin, replying to the sender.
pub async fn send_contact_notification(
    mailer: &Mailer,
    message: &ContactMessage,
) -> Result<(), MailError> {
    mailer
        .send_text(
            mailer.admin_email(),
            Some(&message.email),
            &contact_subject(message),
            contact_body(message),
        )
        .await
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::config::SmtpConfig;
    use crate::models::contactmodel::ContactStatus;

    fn message(subject: &str, phone: &str) -> ContactMessage {
        ContactMessage {
            id: Uuid::new_v4(),
            name: "Wanjiru".to_string(),
            email: "wanjiru@example.com".to_string(),
            phone: phone.to_string(),
            subject: subject.to_string(),
            message: "Do you stock insulin pens?".to_string(),
            status: ContactStatus::New,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn subject_falls_back_to_sender_name() {
        assert_eq!(
            contact_subject(&message("", "")),
            "New contact message from Wanjiru"
        );
        assert_eq!(contact_subject(&message("Stock", "")), "Stock");
    }

    #[test]
    fn body_marks_missing_fields() {
        let body = contact_body(&message("", ""));
        assert!(body.contains("Phone: N/A"));
        assert!(body.contains("Subject: N/A"));
        assert!(body.ends_with("Do you stock insulin pens?\n"));
    }

    #[tokio::test]
    async fn missing_admin_address_is_an_error() {
        let mailer = Mailer::new(SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "Pharmacy Store <noreply@pharmacy.local>".to_string(),
            admin_email: String::new(),
        });
        let result = send_contact_notification(&mailer, &message("", "")).await;
        assert!(matches!(result, Err(MailError::NoRecipient)));
    }
}
