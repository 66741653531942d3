// # mailnudged - one-shot notification sender
//
// Every invocation sends one notification email and exits.
//
// The binary is a THIN integration layer: all decisions (provider
// detection, port fallback, transport selection, retry, failure
// classification) live in mailnudge-core, and the SMTP session lives in
// mailnudge-smtp. This file only:
// 1. Reads process settings from environment variables
// 2. Initializes tracing and the runtime
// 3. Runs load → resolve → probe → send in order and reports the result
// 4. Pauses before exiting so the console output can be read
//
// ## Configuration
//
// Delivery settings come from the config file (see mailnudge_core::config).
// Process settings come from environment variables:
//
// - `MAILNUDGE_CONFIG`: Path of the config file (default: email_config.txt)
// - `MAILNUDGE_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export MAILNUDGE_CONFIG=/etc/mailnudge/email_config.txt
// mailnudged
// ```

use anyhow::Result;
use mailnudge_core::config::{self, ConfigStatus, DEFAULT_CONFIG_FILE};
use mailnudge_core::message::TIMESTAMP_FORMAT;
use mailnudge_core::registry::ProviderTable;
use mailnudge_core::resolver;
use mailnudge_core::traits::ConnectivityProbe;
use mailnudge_core::{Envelope, RetryController, RetryPolicy, Settings, TcpProbe};
use mailnudge_smtp::LettreMailer;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Pause after a successful delivery
const PAUSE_AFTER_SUCCESS: Duration = Duration::from_secs(3);
/// Pause after all attempts failed
const PAUSE_AFTER_FAILURE: Duration = Duration::from_secs(10);
/// Pause after writing the config template
const PAUSE_AFTER_TEMPLATE: Duration = Duration::from_secs(5);
/// Pause when the config exists but cannot be used
const PAUSE_AFTER_BAD_CONFIG: Duration = Duration::from_secs(3);
/// Pause after an unexpected internal error
const PAUSE_AFTER_INTERNAL_ERROR: Duration = Duration::from_secs(5);

/// Exit codes for different termination scenarios
///
/// Delivery success and delivery failure both exit cleanly; only internal
/// errors are distinguished.
#[derive(Debug, Clone, Copy)]
enum MailnudgeExitCode {
    /// Run finished (delivered, failed, or stopped for configuration)
    CleanExit = 0,
    /// Invalid process settings (environment)
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MailnudgeExitCode> for ExitCode {
    fn from(code: MailnudgeExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// How a run ended, before the exit pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Delivered,
    Failed,
    TemplateCreated,
    ConfigRejected,
}

impl RunOutcome {
    fn pause(&self) -> Duration {
        match self {
            RunOutcome::Delivered => PAUSE_AFTER_SUCCESS,
            RunOutcome::Failed => PAUSE_AFTER_FAILURE,
            RunOutcome::TemplateCreated => PAUSE_AFTER_TEMPLATE,
            RunOutcome::ConfigRejected => PAUSE_AFTER_BAD_CONFIG,
        }
    }
}

/// Process settings
struct AppConfig {
    config_path: PathBuf,
    log_level: String,
}

impl AppConfig {
    /// Load process settings from environment variables
    fn from_env() -> Self {
        Self {
            config_path: env::var("MAILNUDGE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
            log_level: env::var("MAILNUDGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the process settings
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("MAILNUDGE_CONFIG cannot be empty");
        }

        if parse_level(&self.log_level).is_none() {
            anyhow::bail!(
                "MAILNUDGE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let config = AppConfig::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return MailnudgeExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&config.log_level).unwrap_or(Level::INFO))
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MailnudgeExitCode::ConfigError.into();
    }

    // Strictly sequential: nothing is spawned, a single thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MailnudgeExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_until_interrupted(&config)).into()
}

/// Run once, stopping promptly on Ctrl-C (including during pauses)
async fn run_until_interrupted(config: &AppConfig) -> MailnudgeExitCode {
    tokio::select! {
        code = run_and_pause(config) => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user");
            MailnudgeExitCode::CleanExit
        }
    }
}

async fn run_and_pause(config: &AppConfig) -> MailnudgeExitCode {
    match run(config).await {
        Ok(outcome) => {
            let pause = outcome.pause();
            info!("Exiting in {} seconds...", pause.as_secs());
            tokio::time::sleep(pause).await;
            MailnudgeExitCode::CleanExit
        }
        Err(e) => {
            error!("Unexpected error: {}", e);
            info!("Exiting in {} seconds...", PAUSE_AFTER_INTERNAL_ERROR.as_secs());
            tokio::time::sleep(PAUSE_AFTER_INTERNAL_ERROR).await;
            MailnudgeExitCode::RuntimeError
        }
    }
}

/// Load, resolve, probe and send
async fn run(config: &AppConfig) -> Result<RunOutcome> {
    print_banner();

    let path = &config.config_path;
    let settings = match config::load(path).await {
        Ok(ConfigStatus::Loaded(settings)) => settings,
        Ok(ConfigStatus::Created(path)) => {
            warn!("Configuration missing");
            info!("Created config file {}", path.display());
            info!("Next steps:");
            info!("1. Edit {}", path.display());
            info!("2. Fill in the sender, password and recipient");
            info!("3. Run this program again");
            return Ok(RunOutcome::TemplateCreated);
        }
        Err(e) if e.is_config() => {
            warn!("Configuration could not be loaded: {}", e);
            info!("Please check and edit {}", path.display());
            return Ok(RunOutcome::ConfigRejected);
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = settings.validate() {
        warn!("Configuration incomplete: {}", e);
        info!("Please check and edit {}", path.display());
        return Ok(RunOutcome::ConfigRejected);
    }

    print_summary(&settings);

    let probe = TcpProbe::new();
    let resolution = resolver::resolve(&settings, &ProviderTable::builtin(), &probe).await;
    let settings = resolution.settings;
    if resolution.provider.is_some() {
        info!("Server: {}:{}", settings.smtp_server, settings.port);
    }

    print_separator();

    info!("Checking network connectivity...");
    let report = probe.probe(&settings.smtp_server, settings.port).await;
    for step in &report.steps {
        info!("{}", step);
    }
    if !report.is_reachable() {
        warn!("Connectivity check failed, attempting delivery anyway");
        info!("If delivery fails, check the network settings or try the other port");
    }

    info!("Sending...");
    print_separator();

    let envelope = Envelope::compose(&settings, chrono::Local::now());
    let (controller, mut event_rx) = RetryController::new(
        Box::new(LettreMailer::new()),
        RetryPolicy::from_settings(&settings),
    );
    let send_report = controller.send(&settings, &envelope).await;

    while let Ok(event) = event_rx.try_recv() {
        debug!("Engine event: {:?}", event);
    }

    print_separator();
    if send_report.is_success() {
        info!("Message delivered");
        info!(
            "Completed at {}",
            chrono::Local::now().format(TIMESTAMP_FORMAT)
        );
        info!(
            "1 message sent in {} attempt(s); the next run sends a new one",
            send_report.attempts
        );
        Ok(RunOutcome::Delivered)
    } else {
        error!("Delivery failed after {} attempt(s)", send_report.attempts);
        if let Some(failure) = &send_report.last_failure {
            error!("Last error: {}", failure);
        }
        info!("Troubleshooting:");
        info!("1. Check the network connection");
        info!("2. Verify the config file values");
        info!("3. Try the other port (587 -> 465 or 465 -> 587)");
        info!("4. Check firewall settings");
        info!("5. Try a different network");
        Ok(RunOutcome::Failed)
    }
}

fn print_banner() {
    print_separator();
    info!("mailnudge v{}: one run, one notification", env!("CARGO_PKG_VERSION"));
    print_separator();
}

fn print_summary(settings: &Settings) {
    info!("From: {}", settings.sender_email);
    info!("To: {}", settings.receiver_email);
    info!("Subject: {}", settings.subject);
}

fn print_separator() {
    info!("{}", "=".repeat(50));
}
