//! SMTP delivery of ticket confirmations using Lettre.
use boletera_engine::{
    db_types::Ticket,
    traits::{Credential, Notifier, NotifyError},
};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
};
use log::*;

use crate::config::SmtpConfig;

#[derive(Clone)]
pub struct SmtpNotifier {
    config: SmtpConfig,
    admin_email: Option<String>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig, admin_email: Option<String>) -> Self {
        Self { config, admin_email }
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| NotifyError::SendError(format!("SMTP relay error: {e}")))?
            .port(self.config.port);
        if !self.config.user.is_empty() {
            let credentials = Credentials::new(self.config.user.clone(), self.config.password.reveal().clone());
            builder = builder.credentials(credentials);
        }
        Ok(builder.build())
    }

    fn from_mailbox(&self) -> Result<Mailbox, NotifyError> {
        format!("{} <{}>", self.config.sender_name, self.config.sender_email)
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("Invalid from address: {e}")))
    }

    /// The buyer's address when we have one; otherwise fall back to the configured sender so the
    /// operator at least receives the ticket and can forward it manually.
    fn resolve_recipient(&self, ticket: &Ticket) -> Result<String, NotifyError> {
        let buyer = ticket.buyer_email.trim();
        if !buyer.is_empty() {
            return Ok(buyer.to_string());
        }
        let fallback = self.config.sender_email.trim();
        if !fallback.is_empty() {
            warn!("💌️ Ticket {} has no buyer email. Sending to the configured sender instead.", ticket.id);
            return Ok(fallback.to_string());
        }
        Err(NotifyError::NoRecipient)
    }

    fn build_message(
        &self,
        to: &str,
        ticket: &Ticket,
        credential: Option<&Credential>,
    ) -> Result<Message, NotifyError> {
        let to = to.parse().map_err(|e| NotifyError::InvalidMessage(format!("Invalid to address: {e}")))?;
        let subject = format!("Tus boletos – {}", ticket.event_title);
        let html_body = ticket_email_html(ticket, credential);
        let mut multipart = MultiPart::mixed()
            .singlepart(SinglePart::builder().header(ContentType::TEXT_HTML).body(html_body));
        if let Some(credential) = credential {
            let content_type = ContentType::parse(&credential.mime_type)
                .map_err(|e| NotifyError::InvalidMessage(format!("Invalid attachment type: {e}")))?;
            multipart = multipart
                .singlepart(Attachment::new(credential.file_name.clone()).body(credential.content.clone(), content_type));
        }
        let mut builder = Message::builder().from(self.from_mailbox()?).to(to).subject(subject);
        if let Some(reply_to) = &self.config.reply_to {
            if let Ok(mailbox) = reply_to.parse() {
                builder = builder.reply_to(mailbox);
            }
        }
        builder.multipart(multipart).map_err(|e| NotifyError::InvalidMessage(format!("Failed to build email: {e}")))
    }
}

impl Notifier for SmtpNotifier {
    async fn send_ticket(&self, ticket: &Ticket, credential: Option<&Credential>) -> Result<(), NotifyError> {
        let recipient = self.resolve_recipient(ticket)?;
        let mailer = self.build_transport()?;
        let message = self.build_message(&recipient, ticket, credential)?;
        mailer.send(message).await.map_err(|e| NotifyError::SendError(e.to_string()))?;
        info!("💌️ Ticket {} sent to {recipient}", ticket.id);

        // The operator copy is strictly best-effort; its failure never bubbles up.
        if let Some(admin) = self.admin_email.as_deref().filter(|a| *a != recipient) {
            match self.build_message(admin, ticket, credential) {
                Ok(copy) => {
                    if let Err(e) = mailer.send(copy).await {
                        warn!("💌️ Could not send the operator copy for ticket {} to {admin}. {e}", ticket.id);
                    }
                },
                Err(e) => warn!("💌️ Could not build the operator copy for ticket {}. {e}", ticket.id),
            }
        }
        Ok(())
    }
}

fn ticket_email_html(ticket: &Ticket, credential: Option<&Credential>) -> String {
    let validate_line = credential
        .map(|c| {
            format!(
                r#"<p>Puedes presentar el QR adjunto en la entrada. También puedes validar aquí:<br/>
      <a href="{url}">{url}</a></p>"#,
                url = c.verify_url
            )
        })
        .unwrap_or_default();
    format!(
        r#"
      <p>¡Gracias por tu compra!</p>
      <p><b>{event_title}</b><br/>
      {function_label}</p>
      <p><b>Boleto:</b> {id}</p>
      {validate_line}
    "#,
        event_title = ticket.event_title,
        function_label = ticket.function_label,
        id = ticket.id,
    )
}

#[cfg(test)]
mod test {
    use blt_common::Pesos;
    use boletera_engine::db_types::TicketId;
    use chrono::Utc;

    use super::*;

    fn ticket(buyer_email: &str) -> Ticket {
        Ticket {
            id: TicketId::from("t-abc123def456".to_string()),
            payment_ref: None,
            buyer_name: "Ana".to_string(),
            buyer_email: buyer_email.to_string(),
            buyer_phone: None,
            event_title: "Los Miserables".to_string(),
            function_id: "funcion-1".to_string(),
            function_label: "Sáb 6 Dic 18:00".to_string(),
            price: Pesos::from(25_000),
            currency: "MXN".to_string(),
            used: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn notifier(sender: &str) -> SmtpNotifier {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 465,
            user: "mailer".to_string(),
            password: blt_common::Secret::new("pw".to_string()),
            sender_email: sender.to_string(),
            sender_name: "Boletera".to_string(),
            reply_to: None,
        };
        SmtpNotifier::new(config, None)
    }

    #[test]
    fn recipient_falls_back_to_sender_when_buyer_email_is_missing() {
        let n = notifier("taquilla@example.com");
        assert_eq!(n.resolve_recipient(&ticket("ana@example.com")).unwrap(), "ana@example.com");
        assert_eq!(n.resolve_recipient(&ticket("")).unwrap(), "taquilla@example.com");
    }

    #[test]
    fn no_recipient_at_all_is_an_error_before_any_send_is_attempted() {
        let n = notifier("");
        assert!(matches!(n.resolve_recipient(&ticket("")), Err(NotifyError::NoRecipient)));
    }

    #[test]
    fn message_builds_with_and_without_attachment() {
        let n = notifier("taquilla@example.com");
        let t = ticket("ana@example.com");
        let credential = Credential {
            file_name: "boleto-t-abc123def456.svg".to_string(),
            mime_type: "image/svg+xml".to_string(),
            content: b"<svg/>".to_vec(),
            verify_url: "https://boletos.example.com/tickets/t-abc123def456".to_string(),
        };
        assert!(n.build_message("ana@example.com", &t, Some(&credential)).is_ok());
        assert!(n.build_message("ana@example.com", &t, None).is_ok());
    }
}
