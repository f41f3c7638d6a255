//! Email hash integrity and email-domain classification.
//!
//! The hash is an index key for ban lookups, not a security boundary: it only
//! has to be reproducible by the component that stamps it on the signup.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Lower-hex MD5 digest of the email, as stamped in the `email-hash` label.
pub fn email_hash(email: &str) -> String {
    format!("{:x}", Md5::digest(email.as_bytes()))
}

/// Recompute the hash from the email and compare it to the stored label.
pub fn is_valid_email_hash(email: &str, hash: &str) -> bool {
    email_hash(email) == hash
}

/// Coarse email-domain bucket used to label counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailDomain {
    Internal,
    External,
}

impl EmailDomain {
    /// Classify an address against the configured internal domains
    /// (case-insensitive, exact domain match).
    pub fn classify(email: &str, internal_domains: &[String]) -> Self {
        let domain = email
            .rsplit_once('@')
            .map(|(_, d)| d.to_ascii_lowercase())
            .unwrap_or_default();
        if internal_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&domain))
        {
            EmailDomain::Internal
        } else {
            EmailDomain::External
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmailDomain::Internal => "internal",
            EmailDomain::External => "external",
        }
    }
}
