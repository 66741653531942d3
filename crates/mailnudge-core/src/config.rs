//! Delivery settings and the `key=value` config file
//!
//! This module defines [`Settings`], the flat record every other component
//! reads, and the loader that fills it from a plain-text config file.
//!
//! ## File Format
//!
//! ```text
//! # comment
//! sender_email=me@gmail.com
//! port=587
//! enable_html=false
//! ```
//!
//! Blank lines, `#` comments, lines without `=` and unknown keys are
//! skipped. When the file does not exist, [`load`] writes [`TEMPLATE`] in
//! its place and reports [`ConfigStatus::Created`].

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::ProviderEntry;

/// Default config file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "email_config.txt";

/// Substring marking a value that still holds a template placeholder
pub const PLACEHOLDER_MARKER: &str = "your_";

/// Template written when no config file exists
///
/// Every value in it equals the corresponding [`Settings::default`] field.
pub const TEMPLATE: &str = "\
# mailnudge SMTP configuration
# Edit the values below, then run the program again.

# Sender account
sender_email=your_email@gmail.com
sender_password=your_app_password

# Recipient
receiver_email=student@example.com

# SMTP server (detected from the sender address for well-known providers)
smtp_server=smtp.gmail.com
port=587

# Message
subject=Reminder
enable_html=false

# Network (optional)
timeout=30
retry_count=3
connection_type=auto

# connection_type:
#   auto - pick from the port (465 = implicit TLS, otherwise STARTTLS)
#   ssl  - always use implicit TLS (usually port 465)
#   tls  - always use STARTTLS (usually port 587)

# Notes:
# 1. Gmail needs 2-step verification and an app password
# 2. QQ Mail needs SMTP enabled and an authorization code
# 3. 163 Mail needs a client authorization password
# 4. On an unstable network raise timeout and retry_count
# 5. Some networks block 587; try the implicit TLS port 465 instead
";

/// Transport preference from the `connection_type` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Choose from the port number
    #[default]
    Auto,
    /// Force implicit TLS (`ssl`)
    ImplicitTls,
    /// Force STARTTLS (`tls`)
    StartTls,
}

impl TransportMode {
    /// Parse a `connection_type` value (case-insensitive)
    ///
    /// Unknown values select STARTTLS, the same path any unmatched
    /// mode/port combination takes.
    pub fn from_config_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "auto" => TransportMode::Auto,
            "ssl" => TransportMode::ImplicitTls,
            "tls" => TransportMode::StartTls,
            other => {
                warn!("Unknown connection_type '{}', falling back to STARTTLS", other);
                TransportMode::StartTls
            }
        }
    }

    /// The value as written in the config file
    pub fn as_config_value(&self) -> &'static str {
        match self {
            TransportMode::Auto => "auto",
            TransportMode::ImplicitTls => "ssl",
            TransportMode::StartTls => "tls",
        }
    }
}

/// Delivery settings for one run
///
/// Built once per run and never edited in place; helpers such as
/// [`Settings::with_provider`] return a modified copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Sender address, also the SMTP login
    pub sender_email: String,
    /// SMTP password or app-specific password
    /// ⚠️ NEVER log this value
    pub sender_password: String,
    /// Recipient address
    pub receiver_email: String,
    /// SMTP server hostname
    pub smtp_server: String,
    /// SMTP server port
    pub port: u16,
    /// Subject line
    pub subject: String,
    /// Send an HTML body instead of plain text
    pub enable_html: bool,
    /// Per network call timeout (in seconds)
    pub timeout_secs: u64,
    /// Maximum delivery attempts
    pub retry_count: u32,
    /// Transport preference
    pub connection_type: TransportMode,
}

// Custom Debug implementation that hides the password
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"<REDACTED>")
            .field("receiver_email", &self.receiver_email)
            .field("smtp_server", &self.smtp_server)
            .field("port", &self.port)
            .field("subject", &self.subject)
            .field("enable_html", &self.enable_html)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_count", &self.retry_count)
            .field("connection_type", &self.connection_type)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sender_email: "your_email@gmail.com".to_string(),
            sender_password: "your_app_password".to_string(),
            receiver_email: "student@example.com".to_string(),
            smtp_server: "smtp.gmail.com".to_string(),
            port: 587,
            subject: "Reminder".to_string(),
            enable_html: false,
            timeout_secs: 30,
            retry_count: 3,
            connection_type: TransportMode::Auto,
        }
    }
}

impl Settings {
    /// Parse config file contents on top of the defaults
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] when `port`, `timeout` or
    /// `retry_count` is not an integer in range.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut settings = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                debug!("Skipping malformed config line: {}", line);
                continue;
            };

            settings.apply(key.trim(), value.trim())?;
        }

        Ok(settings)
    }

    /// Set one recognized key; unknown keys are ignored
    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "sender_email" => self.sender_email = value.to_string(),
            "sender_password" => self.sender_password = value.to_string(),
            "receiver_email" => self.receiver_email = value.to_string(),
            "smtp_server" => self.smtp_server = value.to_string(),
            "subject" => self.subject = value.to_string(),
            "port" => self.port = parse_number(key, value)?,
            "timeout" => self.timeout_secs = parse_number(key, value)?,
            "retry_count" => self.retry_count = parse_number(key, value)?,
            "enable_html" => self.enable_html = value.eq_ignore_ascii_case("true"),
            "connection_type" => self.connection_type = TransportMode::from_config_value(value),
            _ => debug!("Ignoring unknown config key: {}", key),
        }
        Ok(())
    }

    /// Check that the identity fields hold real values
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] naming the first empty or
    /// placeholder field among sender, password and recipient.
    pub fn validate(&self) -> Result<()> {
        let identity = [
            ("sender_email", &self.sender_email),
            ("sender_password", &self.sender_password),
            ("receiver_email", &self.receiver_email),
        ];

        for (key, value) in identity {
            if value.is_empty() {
                return Err(Error::config_invalid(key, "value is empty"));
            }
            if value.contains(PLACEHOLDER_MARKER) {
                return Err(Error::config_invalid(key, "value is still a template placeholder"));
            }
        }

        Ok(())
    }

    /// Whether a send may be attempted with these settings
    pub fn is_ready(&self) -> bool {
        self.validate().is_ok()
    }

    /// Copy with server and standard port taken from a provider entry
    pub fn with_provider(&self, entry: &ProviderEntry) -> Self {
        Self {
            smtp_server: entry.server.to_string(),
            port: entry.port,
            ..self.clone()
        }
    }

    /// Copy with a different port
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    /// Per network call timeout
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| Error::config_invalid(key, format!("'{}': {}", value, e)))
}

/// Result of [`load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigStatus {
    /// No file existed; the template was written to this path
    Created(PathBuf),
    /// The file was read and parsed
    Loaded(Settings),
}

/// Load settings from `path`, writing the template if the file is absent
///
/// Read and parse failures are logged and returned as config errors
/// ([`Error::is_config`]); the caller stops the run just as it does for
/// [`ConfigStatus::Created`]. A template that cannot be written is an
/// [`Error::TemplateWrite`].
pub async fn load(path: impl AsRef<Path>) -> Result<ConfigStatus> {
    let path = path.as_ref();

    if !fs::try_exists(path).await? {
        info!("Config file {} not found, writing template", path.display());
        write_template(path).await?;
        return Ok(ConfigStatus::Created(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).await.map_err(|source| {
        warn!("Failed to read config file {}: {}", path.display(), source);
        Error::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let settings = Settings::parse(&contents).map_err(|e| {
        warn!("Failed to parse config file {}: {}", path.display(), e);
        e
    })?;

    info!("Loaded settings from {}", path.display());
    Ok(ConfigStatus::Loaded(settings))
}

/// Write [`TEMPLATE`] to `path`, creating parent directories as needed
pub async fn write_template(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let template_write = |source: std::io::Error| Error::TemplateWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await.map_err(template_write)?;
    }

    fs::write(path, TEMPLATE).await.map_err(template_write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_keys_are_coerced() {
        let contents = "\
sender_email = me@qq.com
sender_password=abcd=efgh
receiver_email=friend@example.org
smtp_server=smtp.example.org
port=465
subject=Daily check
enable_html=TRUE
timeout=12
retry_count=5
connection_type=SSL
";
        let settings = Settings::parse(contents).unwrap();

        assert_eq!(settings.sender_email, "me@qq.com");
        assert_eq!(settings.sender_password, "abcd=efgh");
        assert_eq!(settings.receiver_email, "friend@example.org");
        assert_eq!(settings.smtp_server, "smtp.example.org");
        assert_eq!(settings.port, 465);
        assert_eq!(settings.subject, "Daily check");
        assert!(settings.enable_html);
        assert_eq!(settings.timeout_secs, 12);
        assert_eq!(settings.retry_count, 5);
        assert_eq!(settings.connection_type, TransportMode::ImplicitTls);
    }

    #[test]
    fn unknown_keys_and_malformed_lines_are_ignored() {
        let contents = "\
# comment line
favourite_colour=blue

this line has no separator
port=2525
";
        let settings = Settings::parse(contents).unwrap();
        assert_eq!(settings, Settings::default().with_port(2525));
    }

    #[test]
    fn enable_html_only_accepts_true() {
        for (value, expected) in [("true", true), ("True", true), ("yes", false), ("1", false)] {
            let settings = Settings::parse(&format!("enable_html={}", value)).unwrap();
            assert_eq!(settings.enable_html, expected, "enable_html={}", value);
        }
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = Settings::parse("port=smtp").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref key, .. } if key == "port"));

        let err = Settings::parse("port=70000").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn unknown_connection_type_selects_starttls() {
        assert_eq!(TransportMode::from_config_value("Auto"), TransportMode::Auto);
        assert_eq!(TransportMode::from_config_value("tls"), TransportMode::StartTls);
        assert_eq!(TransportMode::from_config_value("quic"), TransportMode::StartTls);
    }

    #[test]
    fn placeholder_sender_is_not_ready() {
        let settings = Settings::default();
        assert_eq!(settings.sender_email, "your_email@gmail.com");
        assert!(!settings.is_ready());

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref key, .. } if key == "sender_email"));
    }

    #[test]
    fn real_identity_is_ready() {
        let settings = Settings {
            sender_email: "me@gmail.com".to_string(),
            sender_password: "abcdefghijklmnop".to_string(),
            ..Settings::default()
        };
        assert!(settings.is_ready());

        let empty_recipient = Settings {
            receiver_email: String::new(),
            ..settings
        };
        let err = empty_recipient.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref key, .. } if key == "receiver_email"));
    }

    #[test]
    fn debug_redacts_password() {
        let settings = Settings {
            sender_password: "hunter2-secret".to_string(),
            ..Settings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(debug.contains("<REDACTED>"));
        assert!(!debug.contains("hunter2-secret"));
    }
}
