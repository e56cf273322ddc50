// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recursive policy evaluation.
//!
//! For every node the evaluator:
//!
//! 1. Resolves the node's combining algorithm (unknown names are errors)
//! 2. Evaluates the node's target; if it does not apply the node is
//!    [`Decision::Undetermined`] and its children are never visited
//! 3. Evaluates all children concurrently and folds them with the algorithm,
//!    or, for a rule, returns the rule's effect
//!
//! Any error anywhere in the tree is returned as is; no partial decision is
//! ever produced.

use std::sync::{Arc, LazyLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, instrument};

use crate::combinator::{Apply, ChildEvaluation, Combinator, CombinatorRegistry, PERMIT_OVERRIDES};
use crate::decision::Decision;
use crate::error::Result;
use crate::policy::{Children, PolicyNode, Rule};
use crate::router::AttributeRouter;
use crate::target::{self, Target};

static DEFAULT_EVALUATOR: LazyLock<PolicyEvaluator> = LazyLock::new(PolicyEvaluator::default);

/// Evaluates policy trees against an [`AttributeRouter`].
///
/// The evaluator only holds the combining algorithms; it keeps no state
/// between calls and can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
	combinators: CombinatorRegistry,
	default_apply: String,
}

impl Default for PolicyEvaluator {
	fn default() -> Self {
		Self::with_combinators(CombinatorRegistry::default())
	}
}

impl PolicyEvaluator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_combinators(combinators: CombinatorRegistry) -> Self {
		Self {
			combinators,
			default_apply: PERMIT_OVERRIDES.to_string(),
		}
	}

	/// Sets the algorithm used by nodes without `apply`.
	pub fn with_default_apply(mut self, name: impl Into<String>) -> Self {
		self.default_apply = name.into();
		self
	}

	pub fn register_combinator(
		&mut self,
		name: impl Into<String>,
		combinator: Arc<dyn Combinator>,
	) -> &mut Self {
		self.combinators.register(name, combinator);
		self
	}

	pub fn combinators(&self) -> &CombinatorRegistry {
		&self.combinators
	}

	pub fn default_apply(&self) -> &str {
		&self.default_apply
	}

	/// Evaluates a policy set, policy or rule node.
	#[instrument(level = "debug", skip_all)]
	pub async fn evaluate_policy(&self, node: &PolicyNode, router: &AttributeRouter) -> Result<Decision> {
		let decision = self.evaluate_node(node, router).await?;
		debug!(%decision, "policy evaluated");
		Ok(decision)
	}

	/// Evaluates one rule: `Undetermined` unless its target applies.
	pub async fn evaluate_rule(&self, rule: &Rule, router: &AttributeRouter) -> Result<Decision> {
		if !target::evaluate_target(rule.target.as_ref(), router).await? {
			return Ok(Decision::Undetermined);
		}
		Ok(rule.effect.into())
	}

	pub async fn evaluate_target(&self, target: Option<&Target>, router: &AttributeRouter) -> Result<bool> {
		target::evaluate_target(target, router).await
	}

	fn evaluate_node<'a>(
		&'a self,
		node: &'a PolicyNode,
		router: &'a AttributeRouter,
	) -> BoxFuture<'a, Result<Decision>> {
		async move {
			let container = match node {
				PolicyNode::Rule(rule) => {
					self.resolve_apply(rule.apply.as_ref())?;
					return self.evaluate_rule(rule, router).await;
				}
				PolicyNode::Container(container) => container,
			};

			let combinator = self.resolve_apply(container.apply.as_ref())?;

			if !target::evaluate_target(container.target.as_ref(), router).await? {
				debug!("target does not apply");
				return Ok(Decision::Undetermined);
			}

			let children: Vec<ChildEvaluation<'a>> = match &container.children {
				Children::Policies(policies) => policies
					.iter()
					.map(|child| self.evaluate_node(child, router))
					.collect(),
				Children::Rules(rules) => rules
					.iter()
					.map(|rule| self.evaluate_rule(rule, router).boxed())
					.collect(),
			};

			let decision = combinator.combine(children).await?;
			debug!(%decision, children = container.children.len(), "combined child decisions");
			Ok(decision)
		}
		.boxed()
	}

	fn resolve_apply(&self, apply: Option<&Apply>) -> Result<Arc<dyn Combinator>> {
		match apply {
			Some(apply) => apply.resolve(&self.combinators),
			None => self.combinators.get(&self.default_apply),
		}
	}
}

/// Evaluates `node` with the built-in combining algorithms.
pub async fn evaluate_policy(node: &PolicyNode, router: &AttributeRouter) -> Result<Decision> {
	DEFAULT_EVALUATOR.evaluate_policy(node, router).await
}

/// Evaluates a single rule with the built-in combining algorithms.
pub async fn evaluate_rule(rule: &Rule, router: &AttributeRouter) -> Result<Decision> {
	DEFAULT_EVALUATOR.evaluate_rule(rule, router).await
}

/// Evaluates a target; an absent target applies.
pub async fn evaluate_target(target: Option<&Target>, router: &AttributeRouter) -> Result<bool> {
	target::evaluate_target(target, router).await
}
