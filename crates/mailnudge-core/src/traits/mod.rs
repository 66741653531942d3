//! Core traits for the notifier
//!
//! This module defines the seams between the decision logic and the network.
//!
//! - [`Mailer`]: Perform exactly one delivery attempt
//! - [`ConnectivityProbe`]: Check that an SMTP endpoint is reachable

pub mod mailer;
pub mod probe;

pub use mailer::Mailer;
pub use probe::ConnectivityProbe;
