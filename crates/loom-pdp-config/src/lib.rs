// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Loom policy decision point.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of the configured combining algorithm
//! - Consistent environment variable naming (`LOOM_PDP_*`)
//! - Helpers that turn the configuration into a root router, an evaluator and
//!   the configured policy tree
//!
//! # Usage
//!
//! ```ignore
//! use loom_pdp_config::load_config;
//!
//! let config = load_config()?;
//! let mut root = config.root_router();
//! // register resolvers on `root`, then share it behind an `Arc`
//! let policy = config.load_policy()?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PdpConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use loom_pdp_core::{
	load_policy_file, AttributeRouter, CombinatorRegistry, PolicyEvaluator, PolicyNode,
	RouterOptions,
};
use tracing::{debug, info};

/// Fully resolved policy decision point configuration.
#[derive(Debug, Clone, Default)]
pub struct PdpConfig {
	pub router: RouterConfig,
	pub policy: PolicyConfig,
}

impl PdpConfig {
	pub fn router_options(&self) -> RouterOptions {
		self.router.options()
	}

	/// An empty root router carrying the configured options.
	pub fn root_router(&self) -> AttributeRouter {
		AttributeRouter::with_options(self.router_options())
	}

	/// An evaluator with the built-in algorithms and the configured default.
	pub fn evaluator(&self) -> PolicyEvaluator {
		PolicyEvaluator::new().with_default_apply(self.policy.default_apply.clone())
	}

	/// Loads the configured policy document, or `None` if no path is set.
	pub fn load_policy(&self) -> Result<Option<PolicyNode>, ConfigError> {
		match &self.policy.path {
			Some(path) => Ok(Some(load_policy_file(path)?)),
			None => Ok(None),
		}
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_PDP_*`)
/// 2. Config file (`/etc/loom/pdp.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<PdpConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<PdpConfig, ConfigError> {
	let mut merged = PdpConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<PdpConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<PdpConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PdpConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: PdpConfigLayer) -> Result<PdpConfig, ConfigError> {
	let router = layer.router.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();

	validate_config(&policy)?;

	info!(
		allow_override = router.allow_override,
		policy_path = ?policy.path,
		default_apply = %policy.default_apply,
		"PDP configuration loaded"
	);

	Ok(PdpConfig { router, policy })
}

fn validate_config(policy: &PolicyConfig) -> Result<(), ConfigError> {
	let builtins = CombinatorRegistry::default();
	if !builtins.contains(&policy.default_apply) {
		return Err(ConfigError::InvalidValue {
			key: "policy.default_apply".to_string(),
			message: format!(
				"unknown combining algorithm '{}', expected one of: {}",
				policy.default_apply,
				builtins.names().join(", ")
			),
		});
	}

	if policy.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
		return Err(ConfigError::Validation("policy.path must not be empty".to_string()));
	}

	Ok(())
}
