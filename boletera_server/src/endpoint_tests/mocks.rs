use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use boletera_engine::{
    db_types::{PaymentRef, Ticket},
    traits::{
        Credential,
        CredentialError,
        CredentialRenderer,
        Notifier,
        NotifyError,
        PaymentProvider,
        PaymentRecord,
        ProviderError,
    },
};
use mockall::mock;

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn fetch_payment(&self, payment_ref: &PaymentRef) -> Result<PaymentRecord, ProviderError>;
    }
}

/// Renderer stand-in. Flip `fail` to exercise the degraded-delivery path.
#[derive(Clone)]
pub struct FakeRenderer {
    pub fail: bool,
}

impl CredentialRenderer for FakeRenderer {
    fn render(&self, ticket: &Ticket) -> Result<Credential, CredentialError> {
        if self.fail {
            return Err(CredentialError::RenderError("render disabled in test".to_string()));
        }
        Ok(Credential {
            file_name: format!("boleto-{}.svg", ticket.id),
            mime_type: "image/svg+xml".to_string(),
            content: b"<svg/>".to_vec(),
            verify_url: format!("http://test/tickets/{}", ticket.id),
        })
    }
}

/// Counts deliveries instead of talking SMTP, so tests can assert on "exactly one buyer email".
#[derive(Clone, Default)]
pub struct CountingNotifier {
    pub sent: Arc<AtomicUsize>,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    async fn send_ticket(&self, _ticket: &Ticket, _credential: Option<&Credential>) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
