use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------   PaymentStatus   -----------------------------------------------------------
/// Payment states reported by the provider. Fulfillment only ever proceeds on [`PaymentStatus::Approved`];
/// every other state, including states added by the provider after this enum was written, is
/// deliberately lumped into non-approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Pending,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Approved => "approved",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::InMediation => "in_mediation",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::ChargedBack => "charged_back",
            PaymentStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------   MercadoPayment   ----------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentItem {
    #[serde(default)]
    pub title: Option<String>,
    /// Anything else the provider reports about the item (quantity, unit price) rides along
    /// untyped; fulfilment only reads the title.
    #[serde(flatten)]
    pub extra: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalInfo {
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub items: Vec<PaymentItem>,
}

/// The subset of a `GET /v1/payments/{id}` response that the ticket server consumes. Everything
/// else stays in `extra` so that the raw record can still be audited verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercadoPayment {
    pub id: u64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub additional_info: Option<AdditionalInfo>,
    /// Metadata attached when the checkout preference was created (function id and label).
    #[serde(default)]
    pub metadata: Value,
    #[serde(flatten)]
    pub extra: Value,
}

impl MercadoPayment {
    /// Buyer email, preferring the authoritative payer record.
    pub fn payer_email(&self) -> Option<&str> {
        self.payer
            .as_ref()
            .and_then(|p| p.email.as_deref())
            .or_else(|| {
                self.additional_info.as_ref().and_then(|i| i.payer.as_ref()).and_then(|p| p.email.as_deref())
            })
            .filter(|e| !e.is_empty())
    }

    pub fn payer_name(&self) -> Option<&str> {
        self.additional_info
            .as_ref()
            .and_then(|i| i.payer.as_ref())
            .and_then(|p| p.first_name.as_deref())
            .or_else(|| self.payer.as_ref().and_then(|p| p.first_name.as_deref()))
            .filter(|n| !n.is_empty())
    }

    /// The title of the first purchased item, if the provider echoed one back.
    pub fn item_title(&self) -> Option<&str> {
        self.additional_info
            .as_ref()
            .and_then(|i| i.items.first())
            .and_then(|item| item.title.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

//--------------------------------------   Preferences   -------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub currency_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Request body for `POST /checkout/preferences`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPreference {
    pub items: Vec<PreferenceItem>,
    pub back_urls: BackUrls,
    pub auto_return: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPreference {
    pub id: String,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
    #[serde(flatten)]
    pub extra: Value,
}
