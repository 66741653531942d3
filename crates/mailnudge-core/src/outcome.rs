//! Delivery attempt outcomes
//!
//! A delivery attempt either succeeds or fails with a [`DeliveryFailure`]
//! whose [`FailureKind`] tells the operator what to look at next.
//! Nothing here is persisted; an outcome lives for one retry iteration.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Category of a failed delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The server rejected the credentials
    Auth,
    /// The server refused or dropped the connection
    Connect,
    /// The local network could not reach the server at all
    NetworkUnreachable,
    /// The server hostname could not be resolved
    Dns,
    /// A network call exceeded the configured timeout
    Timeout,
    /// Anything not covered above
    Unknown,
}

impl FailureKind {
    /// Short operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Auth => "authentication failed",
            FailureKind::Connect => "could not connect to SMTP server",
            FailureKind::NetworkUnreachable => "network unreachable",
            FailureKind::Dns => "DNS resolution failed",
            FailureKind::Timeout => "connection timed out",
            FailureKind::Unknown => "send failed",
        }
    }

    /// Remediation hints shown after a failure of this kind
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            FailureKind::Auth => &[
                "Check that the sender address and password are correct",
                "Use an app-specific password or authorization code instead of the login password",
                "Make sure SMTP access is enabled for the mailbox",
            ],
            FailureKind::Connect => &[
                "Check the network connection",
                "Try the other submission port (587 or 465)",
                "Check firewall settings",
            ],
            FailureKind::NetworkUnreachable => &[
                "Check the network connection state",
                "Try restarting the network service",
                "Switch DNS servers (8.8.8.8, 114.114.114.114)",
                "Try a VPN or proxy",
                "Check whether the ISP blocks outbound SMTP ports",
            ],
            FailureKind::Dns => &[
                "Check the DNS settings",
                "Try a public DNS server such as 8.8.8.8",
                "Check the network connection",
            ],
            FailureKind::Timeout => &[
                "Increase the timeout value in the config file",
                "Check network stability",
                "Try a different network",
            ],
            FailureKind::Unknown => &[],
        }
    }

    /// Classify an error by walking its source chain
    ///
    /// The first `std::io::Error` found decides the kind. Errors without an
    /// I/O cause are inspected by message for resolver failures, since
    /// `getaddrinfo` errors surface as uncategorized I/O errors or plain text.
    pub fn classify(err: &(dyn StdError + 'static)) -> FailureKind {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(io_err) = e.downcast_ref::<io::Error>() {
                return Self::from_io(io_err);
            }
            current = e.source();
        }

        if looks_like_dns_failure(&err.to_string()) {
            FailureKind::Dns
        } else {
            FailureKind::Unknown
        }
    }

    /// Classify a socket-level error
    pub fn from_io(err: &io::Error) -> FailureKind {
        match err.kind() {
            io::ErrorKind::TimedOut => FailureKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => FailureKind::Connect,
            io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable => FailureKind::NetworkUnreachable,
            _ if looks_like_dns_failure(&err.to_string()) => FailureKind::Dns,
            _ => FailureKind::Unknown,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn looks_like_dns_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    [
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname",
        "no such host",
        "temporary failure in name resolution",
        "no address associated",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

/// A classified delivery failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DeliveryFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Diagnostic detail from the underlying error
    pub message: String,
}

impl DeliveryFailure {
    /// Create a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a failure from an arbitrary error, classifying it by its source chain
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Self::new(FailureKind::classify(err), err.to_string())
    }
}
