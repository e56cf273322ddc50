// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute-based policy decision point for Loom.
//!
//! This crate evaluates hierarchical policy trees (policy sets containing
//! policies containing rules) against attributes supplied by pluggable
//! resolvers, and returns [`Decision::Permit`], [`Decision::Deny`] or
//! [`Decision::Undetermined`]. It does not authenticate, fetch attributes on
//! its own, or enforce the decision; callers do.
//!
//! # Overview
//!
//! - [`AttributeRouter`]: registry of resolvers keyed by source name, with
//!   per-request children bound to a request context
//! - [`Target`]: OR-of-AND attribute predicates gating each node
//! - [`CombinatorRegistry`]: `permit-overrides` and `deny-overrides`, open for
//!   extension
//! - [`PolicyEvaluator`]: the recursive tree walk
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use loom_pdp_core::{evaluate_policy, AttributeRouter, PolicyNode, Resolver, PERMIT};
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let mut root = AttributeRouter::new();
//! root.register(
//!     "credentials",
//!     Resolver::sync(|_, key, context| {
//!         Ok(context.and_then(|c| c.get(key)).cloned().unwrap_or(Value::Null))
//!     }),
//! )
//! .unwrap();
//! let root = Arc::new(root);
//!
//! let policy = PolicyNode::from_json(&json!({
//!     "target": { "credentials:group": "writer" },
//!     "apply": "deny-overrides",
//!     "rules": [
//!         { "target": { "credentials:blocked": true }, "effect": "deny" },
//!         { "effect": "permit" }
//!     ]
//! }))
//! .unwrap();
//!
//! let request = root.create_child(Some(json!({ "group": ["writer"], "blocked": false })));
//! assert_eq!(evaluate_policy(&policy, &request).await.unwrap(), PERMIT);
//! # });
//! ```

pub mod combinator;
pub mod decision;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod key;
pub mod policy;
pub mod router;
pub mod target;

pub use combinator::{
	deny_overrides, permit_overrides, Apply, ChildEvaluation, Combinator, CombinatorRegistry,
	FoldCombinator, DENY_OVERRIDES, PERMIT_OVERRIDES,
};
pub use decision::{Decision, Effect, DENY, PERMIT, UNDETERMINED};
pub use document::{load_policy_file, parse_policy, parse_policy_json, parse_policy_toml, PolicyFormat};
pub use error::{BoxError, PdpError, Result};
pub use evaluator::{evaluate_policy, evaluate_rule, evaluate_target, PolicyEvaluator};
pub use key::{AttributeKey, DEFAULT_SOURCE};
pub use policy::{Children, Container, PolicyNode, Rule};
pub use router::{
	AttributeRouter, AttributeSource, RegisterOptions, Resolver, RouterOptions, Sources,
};
pub use target::{target_applies, Expected, ExpectedItem, Target, TargetElement};
