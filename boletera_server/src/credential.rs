use boletera_engine::{
    db_types::Ticket,
    traits::{Credential, CredentialError, CredentialRenderer},
};
use qrcode::{render::svg, QrCode};

/// Renders the scannable credential for a ticket: a QR code of the ticket's public lookup URL.
/// Scanning the code and showing the ticket are therefore the same action.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    base_url: String,
}

impl QrRenderer {
    pub fn new(base_url: String) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn verify_url(&self, ticket: &Ticket) -> String {
        format!("{}/tickets/{}", self.base_url, ticket.id)
    }
}

impl CredentialRenderer for QrRenderer {
    fn render(&self, ticket: &Ticket) -> Result<Credential, CredentialError> {
        let verify_url = self.verify_url(ticket);
        let code = QrCode::new(verify_url.as_bytes()).map_err(|e| CredentialError::RenderError(e.to_string()))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(Credential {
            file_name: format!("boleto-{}.svg", ticket.id),
            mime_type: "image/svg+xml".to_string(),
            content: image.into_bytes(),
            verify_url,
        })
    }
}
