//! Glue between the engine's provider-agnostic traits and the Mercado Pago client.
use std::time::Duration;

use boletera_engine::{
    db_types::PaymentRef,
    traits::{PaymentProvider, PaymentRecord, PaymentState, ProviderError},
};
use log::*;
use mp_tools::{helpers::pesos_from_amount, MercadoPagoApi, MercadoPayment, PaymentStatus};

/// Applies the bounded-timeout policy around whatever provider it wraps. A lookup that exceeds
/// the bound is a transient failure: the caller acknowledges the event and waits for the
/// provider's redelivery, and must never assume the payment went through.
pub struct VerifierApi<P> {
    provider: P,
    timeout: Duration,
}

impl<P> VerifierApi<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

impl<P> VerifierApi<P>
where P: PaymentProvider
{
    pub async fn verify(&self, payment_ref: &PaymentRef) -> Result<PaymentRecord, ProviderError> {
        match tokio::time::timeout(self.timeout, self.provider.fetch_payment(payment_ref)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("💳️ Provider lookup for [{payment_ref}] timed out after {:?}", self.timeout);
                Err(ProviderError::Transient(format!("lookup timed out after {:?}", self.timeout)))
            },
        }
    }
}

/// `MercadoPagoApi` speaking the engine's [`PaymentProvider`] language.
#[derive(Debug, Clone)]
pub struct MercadoProvider {
    api: MercadoPagoApi,
}

impl MercadoProvider {
    pub fn new(api: MercadoPagoApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &MercadoPagoApi {
        &self.api
    }
}

impl PaymentProvider for MercadoProvider {
    async fn fetch_payment(&self, payment_ref: &PaymentRef) -> Result<PaymentRecord, ProviderError> {
        match self.api.get_payment(payment_ref.as_str()).await {
            Ok(payment) => Ok(payment_record_from_mercado(payment_ref.clone(), payment)),
            Err(mp_tools::MercadoApiError::PaymentNotFound(_)) => Err(ProviderError::NotFound),
            Err(e) => Err(ProviderError::Transient(e.to_string())),
        }
    }
}

/// Reduce a raw provider payment to the record fulfilment consumes. The checkout attaches the
/// function details as preference metadata, and the provider echoes that metadata back here.
pub fn payment_record_from_mercado(payment_ref: PaymentRef, payment: MercadoPayment) -> PaymentRecord {
    let state = payment_state_from_status(payment.status);
    let amount = payment.transaction_amount.and_then(|amount| {
        pesos_from_amount(amount)
            .map_err(|e| warn!("💳️ Unusable transaction amount on payment [{payment_ref}]. {e}"))
            .ok()
    });
    let currency = payment.currency_id.clone().filter(|c| !c.is_empty());
    let payer_name = payment.payer_name().map(str::to_string);
    let payer_email = payment.payer_email().map(str::to_string);
    let item_title = payment.item_title().map(str::to_string);
    let function_id = payment.metadata_str("function_id").map(str::to_string);
    let function_label = payment.metadata_str("function_label").map(str::to_string);
    let raw = serde_json::to_value(&payment).unwrap_or_else(|e| {
        warn!("💳️ Could not serialize payment [{payment_ref}] for the audit trail. {e}");
        serde_json::Value::Null
    });
    PaymentRecord {
        payment_ref,
        state,
        amount,
        currency,
        payer_name,
        payer_email,
        item_title,
        function_id,
        function_label,
        raw,
    }
}

fn payment_state_from_status(status: PaymentStatus) -> PaymentState {
    match status {
        PaymentStatus::Approved => PaymentState::Approved,
        PaymentStatus::Pending | PaymentStatus::Authorized | PaymentStatus::InProcess | PaymentStatus::InMediation => {
            PaymentState::Pending
        },
        PaymentStatus::Rejected | PaymentStatus::Cancelled => PaymentState::Declined,
        PaymentStatus::Refunded | PaymentStatus::ChargedBack => PaymentState::Refunded,
        PaymentStatus::Unknown => PaymentState::Other("unknown".to_string()),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn payment(json: serde_json::Value) -> MercadoPayment {
        serde_json::from_value(json).expect("invalid test payment")
    }

    #[test]
    fn approved_payment_maps_to_full_record() {
        let p = payment(json!({
            "id": 12345678901u64,
            "status": "approved",
            "transaction_amount": 250.0,
            "currency_id": "MXN",
            "payer": {"email": "ana@example.com"},
            "additional_info": {
                "payer": {"first_name": "Ana"},
                "items": [{"title": "Los Miserables", "quantity": 1, "unit_price": 250.0}]
            },
            "metadata": {"function_id": "funcion-1", "function_label": "Sáb 6 Dic 18:00"}
        }));
        let record = payment_record_from_mercado("12345678901".into(), p);
        assert!(record.state.is_approved());
        assert_eq!(record.amount, Some(blt_common::Pesos::from(25_000)));
        assert_eq!(record.payer_email.as_deref(), Some("ana@example.com"));
        assert_eq!(record.payer_name.as_deref(), Some("Ana"));
        assert_eq!(record.item_title.as_deref(), Some("Los Miserables"));
        assert_eq!(record.function_id.as_deref(), Some("funcion-1"));
        assert_eq!(record.function_label.as_deref(), Some("Sáb 6 Dic 18:00"));
    }

    #[test]
    fn unrecognized_status_is_not_approved() {
        let p = payment(json!({"id": 1u64, "status": "some_future_status"}));
        let record = payment_record_from_mercado("1".into(), p);
        assert!(!record.state.is_approved());
        assert_eq!(record.state, PaymentState::Other("unknown".to_string()));
    }

    #[test]
    fn sparse_payment_leaves_fields_empty() {
        let p = payment(json!({"id": 2u64, "status": "approved"}));
        let record = payment_record_from_mercado("2".into(), p);
        assert!(record.amount.is_none());
        assert!(record.payer_email.is_none());
        assert!(record.function_label.is_none());
    }
}
