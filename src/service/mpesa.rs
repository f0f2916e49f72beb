// service/mpesa.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::MpesaConfig;

// Daraja timestamps are East Africa Time.
const EAT_OFFSET_SECS: i32 = 3 * 3600;

#[derive(Debug, Error)]
pub enum MpesaError {
    #[error("M-Pesa is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StkPushRequest {
    pub phone: String,
    pub amount: i64,
    pub account_reference: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(skip)]
    pub raw: Value,
}

/// Anything that can put an STK prompt on a customer's phone.
#[async_trait]
pub trait StkPushGateway {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, MpesaError>;
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn is_configured(&self) -> bool {
        !self.config.consumer_key.is_empty()
            && !self.config.consumer_secret.is_empty()
            && !self.config.shortcode.is_empty()
            && !self.config.passkey.is_empty()
            && !self.config.callback_url.is_empty()
    }

    /// Callback URL as registered with Daraja, carrying the shared token when set.
    fn callback_url(&self) -> String {
        match &self.config.callback_token {
            Some(token) if !self.config.callback_url.contains("token=") => {
                let separator = if self.config.callback_url.contains('?') { '&' } else { '?' };
                format!("{}{}token={}", self.config.callback_url, separator, token)
            }
            _ => self.config.callback_url.clone(),
        }
    }

    async fn access_token(&self) -> Result<String, MpesaError> {
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.config.base_url()
        );

        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MpesaError::Rejected(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let token: AccessToken = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl StkPushGateway for MpesaClient {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, MpesaError> {
        if !self.is_configured() {
            return Err(MpesaError::NotConfigured);
        }

        let token = self.access_token().await?;
        let timestamp = timestamp(Utc::now());

        let payload = json!({
            "BusinessShortCode": self.config.shortcode,
            "Password": password(&self.config.shortcode, &self.config.passkey, &timestamp),
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": request.amount,
            "PartyA": request.phone,
            "PartyB": self.config.shortcode,
            "PhoneNumber": request.phone,
            "CallBackURL": self.callback_url(),
            "AccountReference": request.account_reference,
            "TransactionDesc": request.description,
        });

        let response = self
            .http
            .post(format!("{}/mpesa/stkpush/v1/processrequest", self.config.base_url()))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            let message = body["errorMessage"]
                .as_str()
                .unwrap_or("STK push failed")
                .to_string();
            return Err(MpesaError::Rejected(message));
        }

        parse_stk_response(body)
    }
}

fn parse_stk_response(body: Value) -> Result<StkPushResponse, MpesaError> {
    let mut parsed: StkPushResponse = serde_json::from_value(body.clone())
        .map_err(|e| MpesaError::Rejected(format!("unexpected STK response: {}", e)))?;

    if !parsed.response_code.is_empty() && parsed.response_code != "0" {
        return Err(MpesaError::Rejected(parsed.response_description));
    }

    parsed.raw = body;
    Ok(parsed)
}

/// `YYYYMMDDHHmmss` in East Africa Time.
pub fn timestamp(now: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(EAT_OFFSET_SECS) {
        Some(eat) => now.with_timezone(&eat).format("%Y%m%d%H%M%S").to_string(),
        None => now.format("%Y%m%d%H%M%S").to_string(),
    }
}

/// base64(shortcode + passkey + timestamp)
pub fn password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_in_nairobi_time() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 22, 5, 9).unwrap();
        assert_eq!(timestamp(now), "20250101010509");
    }

    #[test]
    fn password_concatenates_then_encodes() {
        let encoded = password("174379", "key", "20250101010509");
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"174379key20250101010509");
    }

    #[test]
    fn accepted_response_keeps_identifiers_and_raw_body() {
        let body = json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        });
        let parsed = parse_stk_response(body.clone()).unwrap();
        assert_eq!(parsed.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(parsed.raw, body);
    }

    #[test]
    fn non_zero_response_code_is_rejected() {
        let body = json!({
            "MerchantRequestID": "1",
            "CheckoutRequestID": "2",
            "ResponseCode": "1",
            "ResponseDescription": "Invalid PhoneNumber"
        });
        assert!(matches!(
            parse_stk_response(body),
            Err(MpesaError::Rejected(message)) if message == "Invalid PhoneNumber"
        ));
    }

    #[test]
    fn callback_token_is_appended_once() {
        let client = MpesaClient::new(MpesaConfig {
            environment: "sandbox".to_string(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            shortcode: String::new(),
            passkey: String::new(),
            callback_url: "https://shop.example/api/payments/mpesa/callback".to_string(),
            callback_token: Some("s3cret".to_string()),
        });
        assert_eq!(
            client.callback_url(),
            "https://shop.example/api/payments/mpesa/callback?token=s3cret"
        );
    }
}
