// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for policy decisions.
//!
//! Every variant aborts the evaluation call that produced it. None of them is
//! ever converted into a [`Decision`](crate::Decision).

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by attribute resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for policy decision operations.
pub type Result<T> = std::result::Result<T, PdpError>;

/// Errors that can occur while building or evaluating policies.
#[derive(Debug, Error)]
pub enum PdpError {
	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("invalid target: {0}")]
	InvalidTarget(String),

	#[error("invalid attribute key: {0:?}")]
	InvalidKey(String),

	#[error("rule effect is missing")]
	MissingEffect,

	#[error("rule effect is invalid: {0:?} (expected \"permit\" or \"deny\")")]
	InvalidEffect(String),

	#[error("combining algorithm does not exist: {0}")]
	UnknownCombinator(String),

	#[error("there is a resolver already registered for the source: {0}")]
	DuplicateResolver(String),

	#[error("resolver failed for {key}: {source}")]
	ResolverFailed {
		key: String,
		#[source]
		source: BoxError,
	},

	#[error("failed to read policy file {path}: {source}")]
	PolicyFileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse policy document: {0}")]
	PolicyParse(String),
}

impl PdpError {
	/// Returns true for errors caused by policy or router setup rather than
	/// by attribute data.
	pub fn is_configuration(&self) -> bool {
		!matches!(self, PdpError::ResolverFailed { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::error::Error as _;

	#[test]
	fn resolver_failed_keeps_cause() {
		let cause: BoxError = "backend unavailable".into();
		let err = PdpError::ResolverFailed {
			key: "credentials:group".to_string(),
			source: cause,
		};

		assert!(err.to_string().contains("credentials:group"));
		assert_eq!(err.source().unwrap().to_string(), "backend unavailable");
		assert!(!err.is_configuration());
	}

	#[test]
	fn duplicate_resolver_message_names_source() {
		let err = PdpError::DuplicateResolver("test-override-error".to_string());
		assert_eq!(
			err.to_string(),
			"there is a resolver already registered for the source: test-override-error"
		);
		assert!(err.is_configuration());
	}
}
