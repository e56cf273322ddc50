// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute router configuration.

use loom_pdp_core::RouterOptions;
use serde::Deserialize;

/// Router configuration (runtime, fully resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterConfig {
	/// Whether registering a resolver for a taken source replaces it.
	pub allow_override: bool,
}

impl RouterConfig {
	pub fn options(&self) -> RouterOptions {
		RouterOptions {
			allow_override: self.allow_override,
		}
	}
}

/// Router configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfigLayer {
	#[serde(default)]
	pub allow_override: Option<bool>,
}

impl RouterConfigLayer {
	pub fn merge(&mut self, other: RouterConfigLayer) {
		if other.allow_override.is_some() {
			self.allow_override = other.allow_override;
		}
	}

	pub fn finalize(self) -> RouterConfig {
		RouterConfig {
			allow_override: self.allow_override.unwrap_or(false),
		}
	}
}
