// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading policy documents from JSON or TOML.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{PdpError, Result};
use crate::policy::PolicyNode;

/// Document formats understood by [`load_policy_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
	Json,
	Toml,
}

impl PolicyFormat {
	/// Picks the format from a file extension; anything but `.toml` is JSON.
	pub fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|e| e.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("toml") => PolicyFormat::Toml,
			_ => PolicyFormat::Json,
		}
	}
}

pub fn parse_policy_json(content: &str) -> Result<PolicyNode> {
	let value: Value =
		serde_json::from_str(content).map_err(|e| PdpError::PolicyParse(e.to_string()))?;
	PolicyNode::from_json(&value)
}

/// TOML documents use the same field names as JSON ones. Patterns are
/// written as inline tables: `target = { group = { pattern = "^a" } }`.
pub fn parse_policy_toml(content: &str) -> Result<PolicyNode> {
	let value: Value = toml::from_str(content).map_err(|e| PdpError::PolicyParse(e.to_string()))?;
	PolicyNode::from_json(&value)
}

pub fn parse_policy(content: &str, format: PolicyFormat) -> Result<PolicyNode> {
	match format {
		PolicyFormat::Json => parse_policy_json(content),
		PolicyFormat::Toml => parse_policy_toml(content),
	}
}

/// Reads and parses a policy document from disk.
pub fn load_policy_file(path: impl AsRef<Path>) -> Result<PolicyNode> {
	let path = path.as_ref();
	let format = PolicyFormat::from_path(path);
	debug!(path = %path.display(), ?format, "loading policy document");

	let content = std::fs::read_to_string(path).map_err(|e| PdpError::PolicyFileRead {
		path: path.to_path_buf(),
		source: e,
	})?;
	parse_policy(&content, format)
}
