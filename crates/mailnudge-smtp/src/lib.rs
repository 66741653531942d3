// # SMTP Mailer
//
// This crate provides the `lettre`-based Mailer implementation.
//
// ## Behavior
//
// - ✅ One SMTP session per call: connect, secure, authenticate, send, close
// - ✅ Implicit TLS or STARTTLS, chosen by `Security::select`
// - ✅ PLAIN / LOGIN authentication with the sender address and password
// - ✅ Connect timeout from `Settings::timeout_secs`, and the same bound on
//   the whole exchange (a server that accepts and then stalls fails the
//   attempt as a timeout)
// - ✅ Every error classified into a `FailureKind`
// - ❌ NO retry logic (owned by RetryController)
// - ❌ NO connection pooling across attempts (a transport is built per call)
//
// ## Security Requirements
//
// - The password NEVER appears in logs
// - STARTTLS is required, never opportunistic: a server that does not offer
//   it fails the attempt instead of receiving credentials in clear text

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mailnudge_core::traits::Mailer;
use mailnudge_core::{Body, DeliveryFailure, Envelope, FailureKind, Security, Settings};
use tracing::{debug, info};

/// SMTP reply codes that mean the credentials were rejected
const AUTH_REJECTION_CODES: &[&str] = &["530", "534", "535"];

/// Mailer backed by `lettre`'s async SMTP transport
#[derive(Debug, Clone, Copy, Default)]
pub struct LettreMailer;

impl LettreMailer {
    /// Create a new mailer
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, settings: &Settings, envelope: &Envelope) -> Result<(), DeliveryFailure> {
        let message = build_message(envelope)?;
        debug!("Message prepared for {}", envelope.to);

        let security = Security::select(settings.connection_type, settings.port);
        info!(
            "Connecting to {}:{} using {}",
            settings.smtp_server, settings.port, security
        );
        let transport = build_transport(settings, security)?;

        info!("Authenticating and sending");
        let timeout = settings.timeout();
        match tokio::time::timeout(timeout, transport.send(message)).await {
            Ok(Ok(_response)) => Ok(()),
            Ok(Err(e)) => Err(DeliveryFailure::new(classify(&e), e.to_string())),
            Err(_elapsed) => Err(DeliveryFailure::new(
                FailureKind::Timeout,
                format!("no complete SMTP exchange within {}s", timeout.as_secs()),
            )),
        }
    }

    fn mailer_name(&self) -> &'static str {
        "lettre"
    }
}

/// Build a `lettre::Message` from the envelope
///
/// Non-ASCII subjects are encoded by lettre (RFC 2047, UTF-8).
fn build_message(envelope: &Envelope) -> Result<Message, DeliveryFailure> {
    let from: Mailbox = envelope.from.parse().map_err(|e| {
        DeliveryFailure::new(
            FailureKind::Unknown,
            format!("invalid sender address '{}': {}", envelope.from, e),
        )
    })?;

    let to: Mailbox = envelope.to.parse().map_err(|e| {
        DeliveryFailure::new(
            FailureKind::Unknown,
            format!("invalid recipient address '{}': {}", envelope.to, e),
        )
    })?;

    let content_type = match envelope.body {
        Body::Plain(_) => ContentType::TEXT_PLAIN,
        Body::Html(_) => ContentType::TEXT_HTML,
    };

    Message::builder()
        .from(from)
        .to(to)
        .subject(envelope.subject.as_str())
        .header(content_type)
        .body(envelope.body.content().to_string())
        .map_err(|e| {
            DeliveryFailure::new(FailureKind::Unknown, format!("failed to build email: {}", e))
        })
}

/// Build a single-use transport for `settings`
fn build_transport(
    settings: &Settings,
    security: Security,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryFailure> {
    let tls_parameters = TlsParameters::new(settings.smtp_server.clone()).map_err(|e| {
        DeliveryFailure::new(FailureKind::Unknown, format!("TLS configuration error: {}", e))
    })?;

    let tls = match security {
        Security::ImplicitTls => Tls::Wrapper(tls_parameters),
        Security::StartTls => Tls::Required(tls_parameters),
    };

    let credentials = Credentials::new(
        settings.sender_email.clone(),
        settings.sender_password.clone(),
    );

    Ok(
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.smtp_server.as_str())
            .port(settings.port)
            .tls(tls)
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .timeout(Some(settings.timeout()))
            .build(),
    )
}

/// Map a lettre SMTP error to a failure kind
///
/// SMTP-level authentication rejections are recognized here; socket-level
/// causes are left to [`FailureKind::classify`].
fn classify(error: &smtp::Error) -> FailureKind {
    if let Some(code) = error.status()
        && AUTH_REJECTION_CODES.contains(&code.to_string().as_str())
    {
        return FailureKind::Auth;
    }

    if error.is_timeout() {
        return FailureKind::Timeout;
    }

    let message = error.to_string().to_lowercase();
    if message.contains("authentication") {
        return FailureKind::Auth;
    }

    FailureKind::classify(error)
}
