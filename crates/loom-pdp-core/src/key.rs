// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Namespaced attribute keys (`source:subkey`).

use std::fmt;
use std::str::FromStr;

use crate::error::{PdpError, Result};

/// Source used when a key carries no `source:` prefix.
pub const DEFAULT_SOURCE: &str = "credentials";

/// A parsed attribute reference.
///
/// `credentials:group` names the `group` attribute of the `credentials`
/// source. A bare `group` means the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
	source: String,
	subkey: String,
}

impl AttributeKey {
	pub fn new(source: impl Into<String>, subkey: impl Into<String>) -> Result<Self> {
		let source = source.into();
		let subkey = subkey.into();
		if source.is_empty() || subkey.is_empty() {
			return Err(PdpError::InvalidKey(format!("{source}:{subkey}")));
		}
		Ok(Self { source, subkey })
	}

	/// Splits on the first `:` only, so `external:a:b` has the subkey `a:b`
	/// rather than `a`. A key without `:` belongs to [`DEFAULT_SOURCE`].
	pub fn parse(key: &str) -> Result<Self> {
		let parsed = match key.split_once(':') {
			Some((source, subkey)) => Self::new(source, subkey),
			None => Self::new(DEFAULT_SOURCE, key),
		};
		parsed.map_err(|_| PdpError::InvalidKey(key.to_string()))
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn subkey(&self) -> &str {
		&self.subkey
	}
}

impl fmt::Display for AttributeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.source, self.subkey)
	}
}

impl FromStr for AttributeKey {
	type Err = PdpError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}
