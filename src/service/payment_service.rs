use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::{orderdb::OrderExt, paymentdb::PaymentExt},
    dtos::paymentdtos::InitiateStkDto,
    models::{
        paymentmodel::*,
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        mpesa::{StkPushGateway, StkPushRequest},
    },
};

/// The parts of `Body.stkCallback` needed to settle a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct StkCallback {
    pub checkout_request_id: String,
    pub result_code: String,
    pub result_desc: String,
    pub receipt: Option<String>,
    pub transaction_date: Option<String>,
}

impl StkCallback {
    pub fn is_success(&self) -> bool {
        self.result_code == "0"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// No checkout id, or no payment with that id.
    Ignored,
    AlreadyProcessed,
    Paid { order_id: Uuid },
    Failed,
}

// ResultCode arrives as a number from Daraja but as a string from some proxies.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_callback(payload: &Value) -> Option<StkCallback> {
    let callback = payload.get("Body")?.get("stkCallback")?;

    let checkout_request_id = callback
        .get("CheckoutRequestID")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())?
        .to_string();

    let metadata = callback
        .pointer("/CallbackMetadata/Item")
        .and_then(Value::as_array);

    let find = |name: &str| {
        metadata.and_then(|items| {
            items
                .iter()
                .find(|item| item.get("Name").and_then(Value::as_str) == Some(name))
                .and_then(|item| item.get("Value"))
                .and_then(scalar_to_string)
        })
    };

    Some(StkCallback {
        checkout_request_id,
        result_code: callback
            .get("ResultCode")
            .and_then(scalar_to_string)
            .unwrap_or_default(),
        result_desc: callback
            .get("ResultDesc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        receipt: find("MpesaReceiptNumber"),
        transaction_date: find("TransactionDate"),
    })
}

pub struct PaymentService<D, G> {
    db_client: Arc<D>,
    gateway: Arc<G>,
}

impl<D, G> PaymentService<D, G>
where
    D: OrderExt + PaymentExt + Send + Sync,
    G: StkPushGateway + Send + Sync,
{
    pub fn new(db_client: Arc<D>, gateway: Arc<G>) -> Self {
        Self { db_client, gateway }
    }

    /// Sends the STK prompt and records a pending payment for the order.
    /// Nothing is stored when the gateway refuses the request.
    pub async fn initiate(
        &self,
        caller: &User,
        order_id: Uuid,
        dto: &InitiateStkDto,
    ) -> Result<Payment, ServiceError> {
        let order = self
            .db_client
            .get_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        if order.user_id != caller.id && caller.role != UserRole::Admin {
            return Err(ServiceError::OrderAccessDenied(order_id));
        }

        if order.is_paid {
            return Err(ServiceError::OrderAlreadyPaid);
        }

        let phone = dto.validate_phone().map_err(ServiceError::Validation)?;

        if order.total_price <= 0.0 {
            return Err(ServiceError::Validation("Invalid amount".to_string()));
        }

        let simple = order.id.simple().to_string();
        let request = StkPushRequest {
            phone: phone.clone(),
            amount: order.total_price.ceil() as i64,
            account_reference: format!("ORDER-{}", &simple[simple.len() - 6..]),
            description: "Pharmacy order payment".to_string(),
        };

        let stk = self.gateway.stk_push(request).await?;

        let payment = self
            .db_client
            .save_payment(NewPayment {
                order_id: order.id,
                user_id: order.user_id,
                amount: order.total_price,
                phone,
                merchant_request_id: stk.merchant_request_id,
                checkout_request_id: stk.checkout_request_id,
                result_desc: stk.response_description,
                raw: stk.raw,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            payment_id = %payment.id,
            "STK push sent"
        );
        Ok(payment)
    }

    /// Applies a provider callback. Only a pending payment is ever changed,
    /// so repeated deliveries of the same callback are no-ops.
    pub async fn reconcile(&self, payload: &Value) -> Result<CallbackOutcome, ServiceError> {
        let Some(callback) = parse_callback(payload) else {
            tracing::warn!("M-Pesa callback without CheckoutRequestID");
            return Ok(CallbackOutcome::Ignored);
        };

        let Some(payment) = self
            .db_client
            .get_payment_by_checkout_id(&callback.checkout_request_id)
            .await?
        else {
            tracing::warn!(
                checkout_request_id = %callback.checkout_request_id,
                "M-Pesa callback for unknown payment"
            );
            return Ok(CallbackOutcome::Ignored);
        };

        if payment.status != PaymentStatus::Pending {
            return Ok(CallbackOutcome::AlreadyProcessed);
        }

        let result = PaymentResult {
            result_code: callback.result_code.clone(),
            result_desc: callback.result_desc.clone(),
            receipt: callback.receipt.clone(),
            transaction_date: callback.transaction_date.clone(),
            raw: payload.clone(),
        };

        if callback.is_success() {
            let already_paid = self
                .db_client
                .get_order(payment.order_id)
                .await?
                .map(|order| order.is_paid)
                .unwrap_or(false);
            if already_paid {
                tracing::warn!(
                    payment_id = %payment.id,
                    order_id = %payment.order_id,
                    receipt = ?callback.receipt,
                    "M-Pesa success for an order that was already paid"
                );
            }

            match self.db_client.complete_payment(payment.id, &result).await? {
                Some(settled) => {
                    tracing::info!(
                        payment_id = %settled.id,
                        order_id = %settled.order_id,
                        receipt = ?settled.mpesa.receipt,
                        "M-Pesa payment succeeded"
                    );
                    Ok(CallbackOutcome::Paid {
                        order_id: settled.order_id,
                    })
                }
                None => Ok(CallbackOutcome::AlreadyProcessed),
            }
        } else {
            match self.db_client.fail_payment(payment.id, &result).await? {
                Some(settled) => {
                    tracing::info!(
                        payment_id = %settled.id,
                        result_code = %result.result_code,
                        "M-Pesa payment failed"
                    );
                    Ok(CallbackOutcome::Failed)
                }
                None => Ok(CallbackOutcome::AlreadyProcessed),
            }
        }
    }
}
