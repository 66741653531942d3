//! Provider resolution
//!
//! Turns the loaded [`Settings`] into the settings actually used for
//! delivery. The steps are kept separate:
//!
//! 1. Detect the provider from the sender address ([`ProviderTable::detect`])
//! 2. Apply its server and standard port ([`Settings::with_provider`])
//! 3. Probe the standard port
//! 4. If the probe failed, apply the implicit-TLS port ([`Settings::with_port`])
//!
//! The probe is advisory: the fallback port is used whether or not it is
//! reachable itself, and it is never probed here.

use tracing::{info, warn};

use crate::config::Settings;
use crate::probe::ProbeReport;
use crate::registry::{ProviderEntry, ProviderTable};
use crate::traits::ConnectivityProbe;

/// Result of resolving the settings for a run
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Settings to deliver with
    pub settings: Settings,
    /// Detected provider, if any
    pub provider: Option<&'static ProviderEntry>,
    /// Probe of the provider's standard port (only when a provider matched)
    pub standard_probe: Option<ProbeReport>,
    /// Whether the implicit-TLS port replaced the standard port
    pub used_fallback_port: bool,
}

impl Resolution {
    /// A resolution that leaves `settings` untouched
    pub fn unchanged(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            provider: None,
            standard_probe: None,
            used_fallback_port: false,
        }
    }
}

/// Resolve server and port for `settings`
///
/// # Parameters
///
/// - `settings`: Settings as loaded from the config file
/// - `table`: Provider table to search
/// - `probe`: Probe used to check the provider's standard port
pub async fn resolve(
    settings: &Settings,
    table: &ProviderTable,
    probe: &dyn ConnectivityProbe,
) -> Resolution {
    let Some(entry) = table.detect(&settings.sender_email) else {
        return Resolution::unchanged(settings);
    };

    info!("Detected provider: {}", entry.name);
    let detected = settings.with_provider(entry);

    let report = probe.probe(&detected.smtp_server, detected.port).await;
    for step in &report.steps {
        info!("{}", step);
    }

    let (settings, used_fallback_port) = if report.is_reachable() {
        (detected, false)
    } else {
        warn!(
            "Port {} unreachable, trying implicit TLS port {}",
            entry.port, entry.implicit_tls_port
        );
        (detected.with_port(entry.implicit_tls_port), true)
    };

    Resolution {
        settings,
        provider: Some(entry),
        standard_probe: Some(report),
        used_fallback_port,
    }
}
