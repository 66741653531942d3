//! Well-known mail provider table
//!
//! The table maps a domain key to the provider's SMTP server, its standard
//! submission port and its implicit-TLS port. Lookup is an ordered scan:
//! the first entry whose domain key appears anywhere in the lower-cased
//! address wins, so table order matters.
//!
//! ## Usage
//!
//! ```rust
//! use mailnudge_core::registry::ProviderTable;
//!
//! let table = ProviderTable::builtin();
//! let entry = table.detect("someone@QQ.com").unwrap();
//! assert_eq!(entry.server, "smtp.qq.com");
//! assert_eq!(entry.port, 587);
//! ```

/// A well-known provider's SMTP settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Substring matched against the sender address
    pub domain: &'static str,
    /// SMTP server hostname
    pub server: &'static str,
    /// Standard submission port
    pub port: u16,
    /// Implicit-TLS port
    pub implicit_tls_port: u16,
    /// Display name
    pub name: &'static str,
}

const BUILTIN_PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        domain: "gmail.com",
        server: "smtp.gmail.com",
        port: 587,
        implicit_tls_port: 465,
        name: "Gmail",
    },
    ProviderEntry {
        domain: "qq.com",
        server: "smtp.qq.com",
        port: 587,
        implicit_tls_port: 465,
        name: "QQ Mail",
    },
    ProviderEntry {
        domain: "163.com",
        server: "smtp.163.com",
        port: 25,
        implicit_tls_port: 465,
        name: "NetEase 163",
    },
    ProviderEntry {
        domain: "outlook.com",
        server: "smtp-mail.outlook.com",
        port: 587,
        implicit_tls_port: 465,
        name: "Outlook",
    },
    ProviderEntry {
        domain: "hotmail.com",
        server: "smtp-mail.outlook.com",
        port: 587,
        implicit_tls_port: 465,
        name: "Hotmail",
    },
    ProviderEntry {
        domain: "sina.com",
        server: "smtp.sina.com",
        port: 587,
        implicit_tls_port: 465,
        name: "Sina Mail",
    },
];

/// Ordered, read-only provider table
#[derive(Debug, Clone, Copy)]
pub struct ProviderTable {
    entries: &'static [ProviderEntry],
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderTable {
    /// The built-in table
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_PROVIDERS,
        }
    }

    /// Find the provider for a sender address
    ///
    /// # Returns
    ///
    /// The first entry whose domain key is a substring of the lower-cased
    /// address, or `None`
    pub fn detect(&self, address: &str) -> Option<&'static ProviderEntry> {
        let address = address.to_lowercase();
        self.entries
            .iter()
            .find(|entry| address.contains(entry.domain))
    }
}
