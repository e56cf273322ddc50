// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy document configuration.

use std::path::PathBuf;

use loom_pdp_core::PERMIT_OVERRIDES;
use serde::Deserialize;

/// Policy configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
	/// Policy document to load; `.toml` files are read as TOML, anything else
	/// as JSON.
	pub path: Option<PathBuf>,
	/// Combining algorithm for nodes that do not name one.
	pub default_apply: String,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		PolicyConfigLayer::default().finalize()
	}
}

/// Policy configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfigLayer {
	#[serde(default)]
	pub path: Option<String>,
	#[serde(default)]
	pub default_apply: Option<String>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: PolicyConfigLayer) {
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.default_apply.is_some() {
			self.default_apply = other.default_apply;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			path: self.path.map(PathBuf::from),
			default_apply: self
				.default_apply
				.unwrap_or_else(|| PERMIT_OVERRIDES.to_string()),
		}
	}
}
