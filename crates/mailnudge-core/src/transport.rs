//! Transport selection
//!
//! Decides between implicit TLS and STARTTLS from the configured
//! [`TransportMode`] and port. Mailers call [`Security::select`] and build
//! their connection accordingly.

use std::fmt;

use crate::config::TransportMode;

/// Conventional implicit-TLS submission port
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Ports that conventionally speak plaintext first and upgrade via STARTTLS
pub const STARTTLS_PORTS: &[u16] = &[587, 25];

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte
    ImplicitTls,
    /// Plaintext connection upgraded with STARTTLS before authenticating
    StartTls,
}

impl Security {
    /// Choose the connection security for a mode and port
    ///
    /// - `ssl`, or `auto` on port 465: implicit TLS
    /// - `tls`, or `auto` on port 587 / 25: STARTTLS
    /// - anything else: STARTTLS
    pub fn select(mode: TransportMode, port: u16) -> Self {
        match mode {
            TransportMode::ImplicitTls => Security::ImplicitTls,
            TransportMode::Auto if port == IMPLICIT_TLS_PORT => Security::ImplicitTls,
            TransportMode::StartTls => Security::StartTls,
            TransportMode::Auto if STARTTLS_PORTS.contains(&port) => Security::StartTls,
            TransportMode::Auto => Security::StartTls,
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Security::ImplicitTls => f.write_str("implicit TLS"),
            Security::StartTls => f.write_str("STARTTLS"),
        }
    }
}
