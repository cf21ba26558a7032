//! Static source registry.
//!
//! The registry is assembled once at startup through [`SourceRegistryBuilder`] and never changes
//! afterwards. Iteration order is registration order, which is also the merge order of the
//! published aggregate.

// std
use std::collections::HashSet;
// crates.io
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::{_prelude::*, security};

/// Google's OAuth2 JWKS endpoint.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
/// Microsoft identity platform JWKS endpoint (common tenant).
pub const MICROSOFT_JWKS_URL: &str = "https://login.microsoftonline.com/common/discovery/v2.0/keys";

/// Static description of one key publisher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
	/// Identifier used for lookup, logging, and metrics labels.
	pub id: String,
	/// Human readable name.
	pub name: String,
	/// Location the key set is fetched from.
	pub location: Url,
}
impl SourceDescriptor {
	/// Construct a descriptor, parsing the location.
	pub fn new(
		id: impl Into<String>,
		name: impl Into<String>,
		location: impl AsRef<str>,
	) -> Result<Self> {
		let location = Url::parse(location.as_ref())?;

		Ok(Self { id: id.into(), name: name.into(), location })
	}
}

/// Builder for [`SourceRegistry`].
#[derive(Debug)]
pub struct SourceRegistryBuilder {
	require_https: bool,
	allowed_domains: Vec<String>,
	sources: Vec<SourceDescriptor>,
}
impl SourceRegistryBuilder {
	/// Create a builder that requires HTTPS and allows every host.
	pub fn new() -> Self {
		Self::default()
	}

	/// Enforce HTTPS for source locations (enabled by default).
	pub fn require_https(mut self, require_https: bool) -> Self {
		self.require_https = require_https;

		self
	}

	/// Replace the host allowlist applied to source locations.
	pub fn allowed_domains<I, S>(mut self, domains: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.allowed_domains = security::normalize_allowlist(domains);

		self
	}

	/// Add a source. Sources are kept in the order they are registered.
	pub fn register(mut self, descriptor: SourceDescriptor) -> Self {
		self.sources.push(descriptor);

		self
	}

	/// Parse and add a source from its parts.
	pub fn register_source(
		self,
		id: impl Into<String>,
		name: impl Into<String>,
		location: impl AsRef<str>,
	) -> Result<Self> {
		Ok(self.register(SourceDescriptor::new(id, name, location)?))
	}

	/// Validate every registration and freeze the registry.
	pub fn build(self) -> Result<SourceRegistry> {
		let mut seen = HashSet::with_capacity(self.sources.len());

		for source in &self.sources {
			validate_source_id(&source.id)?;

			if !seen.insert(source.id.as_str()) {
				return Err(Error::Validation {
					field: "id",
					reason: format!("Source '{}' is registered more than once.", source.id),
				});
			}

			security::check_location(&source.location, self.require_https, &self.allowed_domains)?;
		}

		tracing::debug!(sources = self.sources.len(), "source registry built");

		Ok(SourceRegistry { sources: Arc::from(self.sources) })
	}
}
impl Default for SourceRegistryBuilder {
	fn default() -> Self {
		Self { require_https: true, allowed_domains: Vec::new(), sources: Vec::new() }
	}
}

/// Immutable, ordered set of registered sources.
#[derive(Clone, Debug)]
pub struct SourceRegistry {
	sources: Arc<[SourceDescriptor]>,
}
impl SourceRegistry {
	/// Create a [`SourceRegistryBuilder`].
	pub fn builder() -> SourceRegistryBuilder {
		SourceRegistryBuilder::new()
	}

	/// Google and Microsoft, the publishers served when no sources are configured.
	pub fn default_sources() -> Vec<SourceDescriptor> {
		vec![
			SourceDescriptor {
				id: "google".into(),
				name: "google-jwks-api".into(),
				location: Url::parse(GOOGLE_JWKS_URL).expect("static URL is valid"),
			},
			SourceDescriptor {
				id: "microsoft".into(),
				name: "microsoft-jwks-api".into(),
				location: Url::parse(MICROSOFT_JWKS_URL).expect("static URL is valid"),
			},
		]
	}

	/// All sources in registration order.
	pub fn all(&self) -> &[SourceDescriptor] {
		&self.sources
	}

	/// Look up a source by identifier.
	pub fn get(&self, id: &str) -> Option<&SourceDescriptor> {
		self.sources.iter().find(|source| source.id == id)
	}

	/// Number of registered sources.
	pub fn len(&self) -> usize {
		self.sources.len()
	}

	/// Whether no source is registered.
	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}

fn validate_source_id(id: &str) -> Result<()> {
	if id.is_empty() {
		return Err(Error::Validation { field: "id", reason: "Must not be empty.".into() });
	}
	if !id.is_ascii() || id.chars().any(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
		return Err(Error::Validation {
			field: "id",
			reason: format!("Source '{id}' must be ASCII without whitespace."),
		});
	}

	Ok(())
}
