//! Validated domain names
//!
//! A [`Domain`] is the apex the caller wants to host. The `www` variant and
//! the trailing-dot forms used by the DNS provider are derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Prefix of the derived subdomain
pub const WWW_PREFIX: &str = "www.";

/// Longest domain name, without the trailing dot
pub const MAX_NAME_LEN: usize = 253;

/// Longest bucket name storage providers accept
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// A validated apex domain name (e.g. `example.com`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Parse and validate a domain name
    ///
    /// The name is trimmed and lower-cased, and a single trailing dot is
    /// accepted. Label rules follow RFC 1035 (63 chars per label, 253 total,
    /// alphanumerics and inner hyphens only). The derived `www` name must also
    /// fit the 63-character bucket-name limit.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let name = trimmed.strip_suffix('.').unwrap_or(trimmed).to_ascii_lowercase();

        if name.is_empty() {
            return Err(Error::invalid_input("Domain name cannot be empty"));
        }

        if name.len() > MAX_NAME_LEN {
            return Err(Error::invalid_input(format!(
                "Domain name too long: {} chars (max {}). Got: {}",
                name.len(),
                MAX_NAME_LEN,
                name
            )));
        }

        let labels: Vec<&str> = name.split('.').collect();
        for label in &labels {
            if label.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Domain name has empty label: '{}'",
                    name
                )));
            }

            if label.len() > 63 {
                return Err(Error::invalid_input(format!(
                    "Domain label too long: {} chars (max 63). Label: '{}'",
                    label.len(),
                    label
                )));
            }

            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(Error::invalid_input(format!(
                    "Domain label contains invalid characters. Label: '{}'",
                    label
                )));
            }

            if label.starts_with('-') || label.ends_with('-') {
                return Err(Error::invalid_input(format!(
                    "Domain label cannot start or end with hyphen. Label: '{}'",
                    label
                )));
            }
        }

        if labels.len() < 2 {
            return Err(Error::invalid_input(format!(
                "Domain name needs at least two labels: '{}'",
                name
            )));
        }

        // `www.com` is itself an apex
        if labels.len() > 2 && name.starts_with(WWW_PREFIX) {
            return Err(Error::invalid_input(format!(
                "Pass the apex domain, not the www variant: '{}'",
                name
            )));
        }

        // Both names become bucket names; www is the longer one and the
        // bucket limit is tighter than the DNS one
        let www_len = WWW_PREFIX.len() + name.len();
        if www_len > MAX_BUCKET_NAME_LEN {
            return Err(Error::invalid_input(format!(
                "Bucket name www.{} too long: {} chars (max {})",
                name, www_len, MAX_BUCKET_NAME_LEN
            )));
        }

        Ok(Self(name))
    }

    /// The apex name, e.g. `example.com`
    pub fn apex(&self) -> &str {
        &self.0
    }

    /// The `www` variant, e.g. `www.example.com`
    pub fn www(&self) -> String {
        format!("{}{}", WWW_PREFIX, self.0)
    }

    /// The apex in the provider's normalized form, e.g. `example.com.`
    pub fn fqdn(&self) -> String {
        qualify(&self.0)
    }

    /// The `www` variant in normalized form, e.g. `www.example.com.`
    pub fn www_fqdn(&self) -> String {
        qualify(&self.www())
    }
}

/// Append the trailing dot the DNS provider uses for every name
pub fn qualify(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Domain {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl std::str::FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
