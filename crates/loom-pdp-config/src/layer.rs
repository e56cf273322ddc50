// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as read from a single source.

use serde::Deserialize;

use crate::sections::{PolicyConfigLayer, RouterConfigLayer};

/// One source's view of the configuration. Unset sections and fields are
/// `None` and leave lower-precedence values in place when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdpConfigLayer {
	#[serde(default)]
	pub router: Option<RouterConfigLayer>,
	#[serde(default)]
	pub policy: Option<PolicyConfigLayer>,
}

impl PdpConfigLayer {
	pub fn merge(&mut self, other: PdpConfigLayer) {
		merge_section(&mut self.router, other.router, RouterConfigLayer::merge);
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
	}
}

fn merge_section<T: Default>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	if let Some(other) = other {
		merge(base.get_or_insert_with(T::default), other);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = PdpConfigLayer::default();
		base.merge(PdpConfigLayer {
			router: Some(RouterConfigLayer {
				allow_override: Some(true),
			}),
			policy: None,
		});
		assert_eq!(base.router.and_then(|r| r.allow_override), Some(true));
		assert!(base.policy.is_none());
	}

	#[test]
	fn test_parses_from_toml() {
		let layer: PdpConfigLayer = toml::from_str(
			r#"
[router]
allow_override = true

[policy]
path = "/etc/loom/policy.toml"
"#,
		)
		.unwrap();
		let policy = layer.policy.unwrap();
		assert_eq!(policy.path.as_deref(), Some("/etc/loom/policy.toml"));
		assert!(policy.default_apply.is_none());
		assert_eq!(layer.router.unwrap().allow_override, Some(true));
	}
}
