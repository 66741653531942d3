//! Connectivity probe trait
//!
//! A probe answers "can this host:port be reached right now?" without ever
//! failing: every lookup or connect error becomes a negative
//! [`ProbeReport`](crate::probe::ProbeReport).

use async_trait::async_trait;

use crate::probe::ProbeReport;

/// Trait for reachability checks against an SMTP endpoint
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Resolve `host` and try a TCP connect to `host:port`
    async fn probe(&self, host: &str, port: u16) -> ProbeReport;
}
