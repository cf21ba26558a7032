//! Source location checks: HTTPS enforcement and host allowlists.
//!
//! These run once, when the source registry is built. A location that fails them never reaches the
//! fetcher.

// std
use std::collections::HashSet;
// crates.io
use serde::{Deserialize, de::Deserializer};
use url::Url;
// self
use crate::_prelude::*;

/// Canonicalise a DNS name by trimming whitespace, removing any trailing dot, and lowercasing.
pub fn canonicalize_dns_name(value: &str) -> Option<String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return None;
	}

	let without_trailing_dot = trimmed.trim_end_matches('.');
	if without_trailing_dot.is_empty() {
		return None;
	}

	Some(without_trailing_dot.to_ascii_lowercase())
}

/// Normalise an allowlist by canonicalising entries and removing duplicates/empties.
pub fn normalize_allowlist<I, S>(domains: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut normalized = Vec::new();

	for domain in domains {
		if let Some(canonical) = canonicalize_dns_name(domain.as_ref())
			&& seen.insert(canonical.clone())
		{
			normalized.push(canonical);
		}
	}

	normalized
}

/// `serde` helper to normalise allowlist domains during deserialisation.
pub fn deserialize_allowed_domains<'de, D>(
	deserializer: D,
) -> std::result::Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Vec::<String>::deserialize(deserializer)?;

	Ok(normalize_allowlist(raw))
}

/// Ensure the provided URL uses HTTPS.
pub fn enforce_https(url: &Url) -> Result<()> {
	if url.scheme() == "https" {
		Ok(())
	} else {
		Err(Error::Security(format!("Source location {url} must use HTTPS.")))
	}
}

/// Evaluate whether the given hostname is allowed by the provided suffix allowlist.
///
/// When the list is empty, all hosts are considered valid. Entries are expected to be canonical
/// (see [`normalize_allowlist`]).
pub fn host_is_allowed(host: &str, allowed_domains: &[String]) -> bool {
	if allowed_domains.is_empty() {
		return true;
	}

	let Some(host) = canonicalize_dns_name(host) else {
		return false;
	};

	allowed_domains.iter().any(|domain| matches_allowlist(&host, domain))
}

/// Validate a source location against the HTTPS requirement and the host allowlist.
pub fn check_location(url: &Url, require_https: bool, allowed_domains: &[String]) -> Result<()> {
	if require_https {
		enforce_https(url)?;
	}

	let Some(host) = url.host_str() else {
		return Err(Error::Validation {
			field: "location",
			reason: "Must include a host component.".into(),
		});
	};

	if !host_is_allowed(host, allowed_domains) {
		return Err(Error::Validation {
			field: "location",
			reason: format!("Host {host} is not within the allowed_domains allowlist."),
		});
	}

	Ok(())
}

#[inline]
fn matches_allowlist(host: &str, domain: &str) -> bool {
	if host == domain {
		return true;
	}

	host.strip_suffix(domain).and_then(|prefix| prefix.strip_suffix('.')).is_some()
}
