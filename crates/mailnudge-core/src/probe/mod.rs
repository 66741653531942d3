// # Connectivity Probe
//
// DNS + TCP reachability check for the configured SMTP endpoint.
//
// ## Purpose
//
// The probe is diagnostic only. A failed probe never blocks a delivery
// attempt; it changes the warnings shown to the operator and, when run by
// the resolver, whether the implicit-TLS port is tried instead.
//
// ## Steps
//
// 1. Resolve the hostname (a failure here is a DNS failure)
// 2. TCP connect to the resolved addresses with a 10 second timeout
// 3. Drop the socket immediately, whatever the outcome

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::debug;

use crate::outcome::FailureKind;
use crate::traits::ConnectivityProbe;

/// Timeout for the DNS lookup and for the TCP connect
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Which check a [`ProbeStep`] reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCheck {
    /// Hostname resolution
    Dns,
    /// TCP connect to host:port
    Port,
}

/// One line of probe output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStep {
    /// The check performed
    pub check: ProbeCheck,
    /// Whether it passed
    pub ok: bool,
    /// Human-readable detail
    pub detail: String,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.ok { "OK" } else { "FAILED" };
        let what = match self.check {
            ProbeCheck::Dns => "DNS lookup",
            ProbeCheck::Port => "Port connect",
        };
        write!(f, "[{}] {}: {}", marker, what, self.detail)
    }
}

/// Outcome of a reachability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Host that was probed
    pub host: String,
    /// Port that was probed
    pub port: u16,
    /// Steps in the order they ran
    pub steps: Vec<ProbeStep>,
    /// Why the endpoint is unreachable, `None` when it is reachable
    pub failure: Option<FailureKind>,
}

impl ProbeReport {
    /// A report for an endpoint that answered
    pub fn reachable(host: impl Into<String>, port: u16, steps: Vec<ProbeStep>) -> Self {
        Self {
            host: host.into(),
            port,
            steps,
            failure: None,
        }
    }

    /// A report for an endpoint that could not be reached
    pub fn unreachable(
        host: impl Into<String>,
        port: u16,
        steps: Vec<ProbeStep>,
        failure: FailureKind,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            steps,
            failure: Some(failure),
        }
    }

    /// Whether the TCP connect succeeded
    pub fn is_reachable(&self) -> bool {
        self.failure.is_none()
    }
}

/// Probe backed by `tokio::net`
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpProbe {
    /// Create a probe with the default 10 second timeout
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Create a probe with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, FailureKind> {
        match timeout(self.timeout, lookup_host((host, port))).await {
            Ok(Ok(addrs)) => {
                let addrs: Vec<SocketAddr> = addrs.collect();
                if addrs.is_empty() { Err(FailureKind::Dns) } else { Ok(addrs) }
            }
            Ok(Err(e)) => {
                debug!("DNS lookup for {} failed: {}", host, e);
                Err(FailureKind::Dns)
            }
            Err(_) => Err(FailureKind::Dns),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn probe(&self, host: &str, port: u16) -> ProbeReport {
        let mut steps = Vec::with_capacity(2);

        let addrs = match self.resolve(host, port).await {
            Ok(addrs) => {
                steps.push(ProbeStep {
                    check: ProbeCheck::Dns,
                    ok: true,
                    detail: format!("{} -> {}", host, addrs[0].ip()),
                });
                addrs
            }
            Err(kind) => {
                steps.push(ProbeStep {
                    check: ProbeCheck::Dns,
                    ok: false,
                    detail: format!("could not resolve {}", host),
                });
                return ProbeReport::unreachable(host, port, steps, kind);
            }
        };

        let failure = match timeout(self.timeout, TcpStream::connect(&addrs[..])).await {
            // The stream is dropped (closed) right here
            Ok(Ok(_stream)) => None,
            Ok(Err(e)) => {
                debug!("TCP connect to {}:{} failed: {}", host, port, e);
                Some(match FailureKind::from_io(&e) {
                    FailureKind::Unknown => FailureKind::Connect,
                    kind => kind,
                })
            }
            Err(_) => Some(FailureKind::Timeout),
        };

        steps.push(ProbeStep {
            check: ProbeCheck::Port,
            ok: failure.is_none(),
            detail: match failure {
                None => format!("{}:{} is reachable", host, port),
                Some(kind) => format!("{}:{} is not reachable ({})", host, port, kind),
            },
        });

        match failure {
            None => ProbeReport::reachable(host, port, steps),
            Some(kind) => ProbeReport::unreachable(host, port, steps, kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let report = TcpProbe::new().probe("127.0.0.1", port).await;

        assert!(report.is_reachable(), "{:?}", report);
        assert_eq!(report.steps.len(), 2);
        assert!(report.steps.iter().all(|step| step.ok));
        assert!(report.steps[1].to_string().starts_with("[OK] Port connect"));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let report = TcpProbe::with_timeout(Duration::from_secs(2))
            .probe("127.0.0.1", port)
            .await;

        assert!(!report.is_reachable());
        assert!(report.steps[0].ok, "an IP literal always resolves");
        assert!(!report.steps[1].ok);
        assert!(report.steps[1].to_string().starts_with("[FAILED]"));
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let report = TcpProbe::with_timeout(Duration::from_secs(5))
            .probe("mailnudge-probe.invalid", 587)
            .await;

        assert!(!report.is_reachable());
        assert_eq!(report.failure, Some(FailureKind::Dns));
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].check, ProbeCheck::Dns);
    }
}
