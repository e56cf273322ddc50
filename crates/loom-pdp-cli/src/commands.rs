// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use loom_pdp_config::PdpConfig;
use loom_pdp_core::{
	load_policy_file, AttributeRouter, BoxError, Decision, PolicyNode, Resolver, DEFAULT_SOURCE,
};
use serde_json::Value;
use tracing::{debug, info};

/// Evaluates a policy for one request whose credentials are read from
/// `context`.
pub async fn evaluate(config: &PdpConfig, policy: Option<&Path>, context: &Path) -> Result<Decision> {
	let policy = match policy {
		Some(path) => load(path)?,
		None => match config.load_policy()? {
			Some(policy) => policy,
			None => bail!("no --policy given and policy.path is not configured"),
		},
	};

	let context = read_context(context)?;
	let root = Arc::new(root_router(config)?);
	let request = root.create_child(Some(context));

	let decision = config.evaluator().evaluate_policy(&policy, &request).await?;
	info!(%decision, "policy evaluated");
	Ok(decision)
}

pub fn check(policy: &Path) -> Result<()> {
	load(policy).map(|_| ())
}

/// Exit status for any failure. Distinct from every decision status so a
/// broken policy or resolver is never read as a deny.
pub const ERROR_STATUS: u8 = 3;

/// Permit exits 0, deny 1, undetermined 2. Errors exit [`ERROR_STATUS`].
pub fn exit_status(decision: Decision) -> u8 {
	match decision {
		Decision::Permit => 0,
		Decision::Deny => 1,
		Decision::Undetermined => 2,
	}
}

fn load(path: &Path) -> Result<PolicyNode> {
	load_policy_file(path).with_context(|| format!("invalid policy {}", path.display()))
}

fn root_router(config: &PdpConfig) -> Result<AttributeRouter> {
	let mut root = config.root_router();
	root.register(DEFAULT_SOURCE, Resolver::sync(context_lookup))?;
	Ok(root)
}

fn context_lookup(_source: &str, key: &str, context: Option<&Value>) -> Result<Value, BoxError> {
	Ok(context.and_then(|c| c.get(key)).cloned().unwrap_or(Value::Null))
}

fn read_context(path: &Path) -> Result<Value> {
	let content = if path == Path::new("-") {
		let mut buf = String::new();
		std::io::stdin()
			.read_to_string(&mut buf)
			.context("reading context from stdin")?;
		buf
	} else {
		std::fs::read_to_string(path).with_context(|| format!("reading context {}", path.display()))?
	};

	let context: Value = serde_json::from_str(&content).context("context is not valid JSON")?;
	if !context.is_object() {
		bail!("context must be a JSON object");
	}
	debug!(fields = context.as_object().map_or(0, |o| o.len()), "request context loaded");
	Ok(context)
}
