// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decisions produced by the engine and effects declared by rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PdpError;

/// Outcome of evaluating a policy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
	Permit,
	Deny,
	Undetermined,
}

pub const PERMIT: Decision = Decision::Permit;
pub const DENY: Decision = Decision::Deny;
pub const UNDETERMINED: Decision = Decision::Undetermined;

impl Decision {
	pub fn is_permit(self) -> bool {
		self == Decision::Permit
	}

	pub fn is_deny(self) -> bool {
		self == Decision::Deny
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Decision::Permit => "permit",
			Decision::Deny => "deny",
			Decision::Undetermined => "undetermined",
		}
	}
}

impl fmt::Display for Decision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Decision {
	type Err = PdpError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"permit" => Ok(Decision::Permit),
			"deny" => Ok(Decision::Deny),
			"undetermined" => Ok(Decision::Undetermined),
			other => Err(PdpError::Configuration(format!("unknown decision: {other}"))),
		}
	}
}

/// Effect declared by a rule leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
	Permit,
	Deny,
}

impl Effect {
	pub fn as_str(self) -> &'static str {
		match self {
			Effect::Permit => "permit",
			Effect::Deny => "deny",
		}
	}
}

impl From<Effect> for Decision {
	fn from(effect: Effect) -> Self {
		match effect {
			Effect::Permit => Decision::Permit,
			Effect::Deny => Decision::Deny,
		}
	}
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Effect {
	type Err = PdpError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"permit" => Ok(Effect::Permit),
			"deny" => Ok(Effect::Deny),
			other => Err(PdpError::InvalidEffect(other.to_string())),
		}
	}
}
