// # Mailer Trait
//
// Defines the interface for delivering one message over SMTP.
//
// ## Implementations
//
// - lettre: `mailnudge-smtp` crate
//
// ## Usage
//
// ```rust,ignore
// use mailnudge_core::{Envelope, Mailer, Settings};
//
// async fn send_once(mailer: &dyn Mailer, settings: &Settings) {
//     let envelope = Envelope::compose(settings, chrono::Local::now());
//     if let Err(failure) = mailer.send(settings, &envelope).await {
//         eprintln!("{} ({:?})", failure, failure.kind);
//     }
// }
// ```

use async_trait::async_trait;

use crate::config::Settings;
use crate::message::Envelope;
use crate::outcome::DeliveryFailure;

/// Trait for SMTP delivery implementations
///
/// A mailer performs exactly one delivery attempt per call: connect with the
/// security chosen by [`crate::Security::select`], authenticate with the
/// sender credentials, transmit the envelope and close the connection.
///
/// ## Forbidden
///
/// - Retrying or sleeping (owned by [`crate::RetryController`])
/// - Changing server or port (owned by the resolver)
/// - Partial sends: either the whole envelope is accepted or the call fails
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `envelope` using the server, port and credentials in `settings`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The server accepted the message
    /// - `Err(DeliveryFailure)`: Nothing was delivered; the failure is classified
    async fn send(&self, settings: &Settings, envelope: &Envelope) -> Result<(), DeliveryFailure>;

    /// Get the mailer name (for logging/debugging)
    fn mailer_name(&self) -> &'static str;
}
