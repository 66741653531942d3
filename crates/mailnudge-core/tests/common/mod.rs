//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the core
//! drives its seams without touching the network.

#![allow(dead_code)]

use mailnudge_core::traits::{ConnectivityProbe, Mailer};
use mailnudge_core::{DeliveryFailure, Envelope, FailureKind, ProbeReport, Settings};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A Mailer that replays a scripted sequence of outcomes
///
/// Once the script is exhausted every further call fails.
pub struct ScriptedMailer {
    /// Remaining outcomes
    script: Arc<Mutex<VecDeque<Result<(), DeliveryFailure>>>>,
    /// Call counter for send()
    send_call_count: Arc<AtomicUsize>,
}

impl ScriptedMailer {
    pub fn new(script: Vec<Result<(), DeliveryFailure>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            send_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A mailer whose every attempt fails with `kind`
    pub fn always_failing(kind: FailureKind) -> Self {
        let script = (0..32)
            .map(|_| Err(DeliveryFailure::new(kind, "scripted failure")))
            .collect();
        Self::new(script)
    }

    /// Get the number of times send() was called
    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedMailer that shares its script and counter with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            send_call_count: Arc::clone(&other.send_call_count),
        }
    }
}

#[async_trait::async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, _settings: &Settings, _envelope: &Envelope) -> Result<(), DeliveryFailure> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DeliveryFailure::new(FailureKind::Unknown, "script exhausted")))
    }

    fn mailer_name(&self) -> &'static str {
        "scripted"
    }
}

/// A probe that always gives the same verdict and counts calls
pub struct FixedProbe {
    reachable: bool,
    probe_call_count: Arc<AtomicUsize>,
}

impl FixedProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            probe_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times probe() was called
    pub fn probe_call_count(&self) -> usize {
        self.probe_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for FixedProbe {
    async fn probe(&self, host: &str, port: u16) -> ProbeReport {
        self.probe_call_count.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            ProbeReport::reachable(host, port, Vec::new())
        } else {
            ProbeReport::unreachable(host, port, Vec::new(), FailureKind::Connect)
        }
    }
}

/// Helper to create ready settings for testing
pub fn ready_settings() -> Settings {
    Settings {
        sender_email: "user@qq.com".to_string(),
        sender_password: "authorization-code".to_string(),
        receiver_email: "friend@example.org".to_string(),
        ..Settings::default()
    }
}

/// Helper to create an envelope for `settings`
pub fn envelope_for(settings: &Settings) -> Envelope {
    Envelope::compose(settings, chrono::Local::now())
}
