use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MercadoConfig,
    data_objects::{CheckoutPreference, MercadoPayment, NewPreference},
    MercadoApiError,
};

#[derive(Debug, Clone)]
pub struct MercadoPagoApi {
    config: MercadoConfig,
    client: Arc<Client>,
}

impl MercadoPagoApi {
    pub fn new(config: MercadoConfig) -> Result<Self, MercadoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| MercadoApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MercadoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MercadoApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MercadoApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MercadoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MercadoApiError::RestResponseError(e.to_string()))?;
            Err(MercadoApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetch the authoritative record for a payment. A 404 is a distinct outcome, because the
    /// provider is eventually consistent and the record may simply not be visible yet.
    pub async fn get_payment(&self, payment_id: &str) -> Result<MercadoPayment, MercadoApiError> {
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment #{payment_id}");
        let result = self.rest_query::<MercadoPayment, ()>(Method::GET, &path, None).await;
        match result {
            Ok(payment) => {
                info!("Fetched payment #{payment_id} with status {}", payment.status);
                Ok(payment)
            },
            Err(MercadoApiError::QueryError { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(MercadoApiError::PaymentNotFound(payment_id.to_string()))
            },
            Err(e) => Err(e),
        }
    }

    /// Create a Checkout Pro preference. The returned `init_point` is where the buyer gets sent
    /// to pay.
    pub async fn create_preference(&self, preference: NewPreference) -> Result<CheckoutPreference, MercadoApiError> {
        debug!("Creating checkout preference for {} item(s)", preference.items.len());
        let result =
            self.rest_query::<CheckoutPreference, NewPreference>(Method::POST, "/checkout/preferences", Some(preference)).await?;
        info!("Created checkout preference {}", result.id);
        Ok(result)
    }
}
