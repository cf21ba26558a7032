//! Key and key set wire types.
//!
//! Every field is carried as an opaque string. Nothing here parses or validates key material; the
//! aggregator only republishes what upstream publishers advertise.

// crates.io
use serde::{Deserialize, Deserializer, Serialize};

/// One published key descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
	/// Key type (`RSA`, `EC`, `oct`, ...).
	#[serde(default, deserialize_with = "nullable_string")]
	pub kty: String,
	/// Intended use (`sig`, `enc`).
	#[serde(rename = "use", default, deserialize_with = "nullable_string")]
	pub key_use: String,
	/// Algorithm advertised for the key.
	#[serde(default, deserialize_with = "nullable_string")]
	pub alg: String,
	/// Key identifier. Unique within one publisher, not across publishers.
	#[serde(default, deserialize_with = "nullable_string")]
	pub kid: String,
	/// RSA modulus.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub n: String,
	/// RSA public exponent.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub e: String,
	/// Elliptic curve name.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub crv: String,
	/// Curve x coordinate.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub x: String,
	/// Curve y coordinate.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub y: String,
	/// Private component, republished verbatim when an upstream exposes it.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub d: String,
	/// Symmetric key value.
	#[serde(default, deserialize_with = "nullable_string", skip_serializing_if = "String::is_empty")]
	pub k: String,
}

/// Ordered key collection as published by one source, or the merged aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
	/// Keys in publication order.
	#[serde(default, deserialize_with = "nullable_keys")]
	pub keys: Vec<Key>,
}
impl KeySet {
	/// Create an empty key set.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Number of keys in the set.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Whether the set holds no keys.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Iterate over key identifiers in order.
	pub fn kids(&self) -> impl Iterator<Item = &str> {
		self.keys.iter().map(|key| key.kid.as_str())
	}

	/// Concatenate the given sets in iteration order.
	pub fn concat<'a, I>(sets: I) -> Self
	where
		I: IntoIterator<Item = &'a KeySet>,
	{
		let mut keys = Vec::new();

		for set in sets {
			keys.extend(set.keys.iter().cloned());
		}

		Self { keys }
	}
}
impl From<Vec<Key>> for KeySet {
	fn from(keys: Vec<Key>) -> Self {
		Self { keys }
	}
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_keys<'de, D>(deserializer: D) -> Result<Vec<Key>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Vec<Key>>::deserialize(deserializer)?.unwrap_or_default())
}
