//! Notification message rendering
//!
//! The notifier always sends the same message; only the timestamp and the
//! body format change between runs.

use chrono::{DateTime, Local};

use crate::config::Settings;

/// Timestamp format used in message bodies and console reports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message body in its final content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// `text/plain; charset=utf-8`
    Plain(String),
    /// `text/html; charset=utf-8`
    Html(String),
}

impl Body {
    /// Render the notification body stamped with `timestamp`
    pub fn render(html: bool, timestamp: &str) -> Self {
        if html {
            Body::Html(render_html(timestamp))
        } else {
            Body::Plain(render_plain(timestamp))
        }
    }

    /// The body text
    pub fn content(&self) -> &str {
        match self {
            Body::Plain(text) | Body::Html(text) => text,
        }
    }

    /// Whether this is an HTML body
    pub fn is_html(&self) -> bool {
        matches!(self, Body::Html(_))
    }
}

/// A fully rendered message ready for a [`crate::Mailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `From` address
    pub from: String,
    /// `To` address
    pub to: String,
    /// Subject line (encoded by the mailer if it is not ASCII)
    pub subject: String,
    /// Message body
    pub body: Body,
}

impl Envelope {
    /// Compose the notification for `settings`, stamped with `now`
    pub fn compose(settings: &Settings, now: DateTime<Local>) -> Self {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

        Self {
            from: settings.sender_email.clone(),
            to: settings.receiver_email.clone(),
            subject: settings.subject.clone(),
            body: Body::render(settings.enable_html, &timestamp),
        }
    }
}

fn render_plain(timestamp: &str) -> String {
    format!(
        "\
Automatic reminder

This reminder was sent automatically by mailnudge.

Details:
- Sent at: {timestamp}
- Sent via: SMTP
- Version: {version}

What this run exercised:
1. SMTP delivery with implicit TLS or STARTTLS
2. Connectivity diagnostics and failure classification
3. File-based configuration
4. Automatic port fallback (587/465)
5. Per-call timeouts and bounded retries

If you are reading this, SMTP delivery works.

---
Generated by mailnudge
Sent at: {timestamp}",
        timestamp = timestamp,
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn render_html(timestamp: &str) -> String {
    format!(
        "\
<html>
<body>
    <h2>Automatic reminder</h2>
    <p>This reminder was sent automatically by mailnudge.</p>

    <h3>Details</h3>
    <ul>
        <li><strong>Sent at:</strong> {timestamp}</li>
        <li><strong>Sent via:</strong> SMTP</li>
        <li><strong>Version:</strong> {version}</li>
    </ul>

    <h3>What this run exercised</h3>
    <ol>
        <li>SMTP delivery with implicit TLS or STARTTLS</li>
        <li>Connectivity diagnostics and failure classification</li>
        <li>File-based configuration</li>
        <li>Automatic port fallback (587/465)</li>
    </ol>

    <p><em>If you are reading this, SMTP delivery works.</em></p>

    <hr>
    <p><small>Generated by mailnudge<br>
    Sent at: {timestamp}</small></p>
</body>
</html>",
        timestamp = timestamp,
        version = env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn plain_body_embeds_timestamp() {
        let envelope = Envelope::compose(&Settings::default(), fixed_time());

        assert!(!envelope.body.is_html());
        assert!(envelope.body.content().contains("Sent at: 2024-03-09 07:05:01"));
        assert_eq!(envelope.from, "your_email@gmail.com");
        assert_eq!(envelope.to, "student@example.com");
        assert_eq!(envelope.subject, "Reminder");
    }

    #[test]
    fn html_flag_selects_html_body() {
        let settings = Settings {
            enable_html: true,
            ..Settings::default()
        };
        let envelope = Envelope::compose(&settings, fixed_time());

        assert!(envelope.body.is_html());
        assert!(envelope.body.content().starts_with("<html>"));
        assert!(envelope.body.content().contains("2024-03-09 07:05:01"));
    }
}
