//! Compliant username derivation.
//!
//! The requested username is normalised into a legal object name, decorated
//! when it collides with a reserved prefix/suffix, and validated. Collision
//! probing against existing accounts is IO and lives in the reconciler; this
//! module only produces the candidate sequence.

use onboard_core::{DomainError, DomainResult};

/// Total number of candidates probed (the base name plus `-2` … `-100`).
pub const MAX_ATTEMPTS: usize = 100;

/// Token used to decorate names that would otherwise be reserved or illegal.
pub const DECORATION: &str = "crt";

const MAX_LEN: usize = 63;

/// Normalise a requested username into a name-legal candidate.
///
/// Deterministic: the same input always yields the same output.
pub fn transform(requested: &str) -> String {
    let local = requested.split('@').next().unwrap_or_default();
    let source = if local.is_empty() {
        requested.replace('@', "at-")
    } else {
        local.to_string()
    };

    let mut out = String::with_capacity(source.len());
    for c in source.to_lowercase().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    if !out.is_empty() && out.chars().all(|c| c.is_ascii_digit()) {
        out = format!("{DECORATION}-{out}");
    }
    if out.starts_with(['-', '.']) {
        out = format!("{DECORATION}{out}");
    }
    if out.ends_with(['-', '.']) {
        out.push_str(DECORATION);
    }
    out
}

/// Decorate names that start with a forbidden prefix or end with a forbidden
/// suffix. Each decoration is applied at most once.
pub fn decorate(candidate: String, forbidden_prefixes: &[String], forbidden_suffixes: &[String]) -> String {
    let mut name = candidate;
    if forbidden_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
        name = format!("{DECORATION}-{name}");
    }
    if forbidden_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
        name = format!("{name}-{DECORATION}");
    }
    name
}

/// Check the qualified-name grammar: 1–63 chars, alphanumeric at both ends,
/// `[-a-z0-9_.]` in between.
pub fn validate(name: &str) -> DomainResult<()> {
    let invalid = || DomainError::validation(format!("transformed username [{name}] is invalid"));

    if name.is_empty() || name.len() > MAX_LEN {
        return Err(invalid());
    }
    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return Err(invalid());
    }
    if !bytes
        .iter()
        .all(|&b| edge_ok(b) || b == b'-' || b == b'_' || b == b'.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Full pure pipeline: transform, decorate, validate.
pub fn compliant_base(
    requested: &str,
    forbidden_prefixes: &[String],
    forbidden_suffixes: &[String],
) -> DomainResult<String> {
    let name = decorate(transform(requested), forbidden_prefixes, forbidden_suffixes);
    validate(&name)?;
    Ok(name)
}

/// The ordered candidates probed for a base name: `base`, `base-2`, … `base-100`.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    (1..=MAX_ATTEMPTS).map(move |attempt| {
        if attempt == 1 {
            base.to_string()
        } else {
            format!("{base}-{attempt}")
        }
    })
}
