// # mailnudge-core
//
// Core library for the one-shot SMTP notifier.
//
// ## Architecture Overview
//
// This library holds every decision the notifier makes; the SMTP exchange
// itself is delegated to a `Mailer` implementation (see `mailnudge-smtp`):
// - **Settings**: Flat delivery settings loaded from a `key=value` file
// - **ProviderTable**: Ordered table of well-known mail providers
// - **Resolver**: Detects the provider and picks server/port, probing first
// - **ConnectivityProbe**: DNS + TCP reachability check (diagnostic only)
// - **Mailer**: Trait for exactly one delivery attempt
// - **RetryController**: Bounded retry loop with linear backoff
//
// ## Design Principles
//
// 1. **Immutable settings**: Settings is never edited in place; the resolver
//    returns a new value
// 2. **Single-shot seams**: Mailers and probes do one network interaction per
//    call, the controller owns retry and backoff
// 3. **Classified failures**: Every delivery error maps to a `FailureKind`
//    with operator-facing hints

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod message;
pub mod outcome;
pub mod probe;
pub mod resolver;
pub mod transport;

// Re-export core types for convenience
pub use traits::{ConnectivityProbe, Mailer};
pub use engine::{EngineEvent, RetryController, RetryPolicy, SendReport};
pub use registry::{ProviderEntry, ProviderTable};
pub use config::{ConfigStatus, Settings, TransportMode};
pub use error::{Error, Result};
pub use message::{Body, Envelope};
pub use outcome::{DeliveryFailure, FailureKind};
pub use probe::{ProbeReport, ProbeStep, TcpProbe};
pub use resolver::Resolution;
pub use transport::Security;
