// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy trees: policy sets, policies and rules.
//!
//! Policy documents use the shape
//! `{ target?, apply?, policies? | rules? | effect }`. A node carrying
//! `policies` is a policy set, a node carrying `rules` is a policy, and a node
//! with neither is a rule. The shape is decided once, when the document is
//! parsed, and the resulting tree is never modified by evaluation.

use serde_json::{Map, Value};

use crate::combinator::Apply;
use crate::decision::Effect;
use crate::error::{PdpError, Result};
use crate::target::Target;

/// A leaf: when its target applies, its effect is the decision.
#[derive(Debug, Clone)]
pub struct Rule {
	pub target: Option<Target>,
	pub effect: Effect,
	/// Only checked when the rule is the root of an evaluation; a rule never
	/// combines anything.
	pub apply: Option<Apply>,
}

impl Rule {
	pub fn new(effect: Effect) -> Self {
		Self {
			target: None,
			effect,
			apply: None,
		}
	}

	pub fn permit() -> Self {
		Self::new(Effect::Permit)
	}

	pub fn deny() -> Self {
		Self::new(Effect::Deny)
	}

	pub fn with_target(mut self, target: impl Into<Target>) -> Self {
		self.target = Some(target.into());
		self
	}

	pub fn from_json(value: &Value) -> Result<Self> {
		let map = as_object(value, "rule")?;
		Ok(Self {
			target: parse_target(map)?,
			effect: parse_effect(map)?,
			apply: parse_apply(map)?,
		})
	}
}

/// The children of a [`Container`].
#[derive(Debug, Clone)]
pub enum Children {
	/// Nested policies or policy sets (a policy set).
	Policies(Vec<PolicyNode>),
	/// Rule leaves (a policy).
	Rules(Vec<Rule>),
}

impl Children {
	pub fn len(&self) -> usize {
		match self {
			Children::Policies(p) => p.len(),
			Children::Rules(r) => r.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A policy or policy set.
#[derive(Debug, Clone)]
pub struct Container {
	pub target: Option<Target>,
	/// `None` uses the evaluator's default algorithm.
	pub apply: Option<Apply>,
	pub children: Children,
}

impl Container {
	pub fn policies(policies: Vec<PolicyNode>) -> Self {
		Self {
			target: None,
			apply: None,
			children: Children::Policies(policies),
		}
	}

	pub fn rules(rules: Vec<Rule>) -> Self {
		Self {
			target: None,
			apply: None,
			children: Children::Rules(rules),
		}
	}

	pub fn with_target(mut self, target: impl Into<Target>) -> Self {
		self.target = Some(target.into());
		self
	}

	pub fn with_apply(mut self, apply: impl Into<Apply>) -> Self {
		self.apply = Some(apply.into());
		self
	}
}

/// Any node of a policy tree.
#[derive(Debug, Clone)]
pub enum PolicyNode {
	Rule(Rule),
	Container(Container),
}

impl PolicyNode {
	pub fn target(&self) -> Option<&Target> {
		match self {
			PolicyNode::Rule(rule) => rule.target.as_ref(),
			PolicyNode::Container(container) => container.target.as_ref(),
		}
	}

	/// Parses a policy document.
	pub fn from_json(value: &Value) -> Result<Self> {
		let map = as_object(value, "policy node")?;

		let policies = present(map, "policies");
		let rules = present(map, "rules");

		let children = match (policies, rules) {
			(Some(_), Some(_)) => {
				return Err(PdpError::Configuration(
					"policy node cannot carry both policies and rules".to_string(),
				))
			}
			(Some(policies), None) => Children::Policies(
				as_array(policies, "policies")?
					.iter()
					.map(PolicyNode::from_json)
					.collect::<Result<Vec<_>>>()?,
			),
			(None, Some(rules)) => Children::Rules(
				as_array(rules, "rules")?
					.iter()
					.map(Rule::from_json)
					.collect::<Result<Vec<_>>>()?,
			),
			(None, None) => return Rule::from_json(value).map(PolicyNode::Rule),
		};

		Ok(PolicyNode::Container(Container {
			target: parse_target(map)?,
			apply: parse_apply(map)?,
			children,
		}))
	}
}

impl From<Rule> for PolicyNode {
	fn from(rule: Rule) -> Self {
		PolicyNode::Rule(rule)
	}
}

impl From<Container> for PolicyNode {
	fn from(container: Container) -> Self {
		PolicyNode::Container(container)
	}
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
	match value {
		Value::Object(map) => Ok(map),
		Value::Null => Err(PdpError::Configuration(format!("null {what}"))),
		other => Err(PdpError::Configuration(format!(
			"{what} must be an object, got {other}"
		))),
	}
}

fn as_array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>> {
	value
		.as_array()
		.ok_or_else(|| PdpError::Configuration(format!("`{field}` must be an array, got {value}")))
}

/// A field that is missing or `null` is treated as absent.
fn present<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
	map.get(field).filter(|v| !v.is_null())
}

fn parse_target(map: &Map<String, Value>) -> Result<Option<Target>> {
	present(map, "target").map(Target::from_json).transpose()
}

fn parse_apply(map: &Map<String, Value>) -> Result<Option<Apply>> {
	match present(map, "apply") {
		None => Ok(None),
		Some(Value::String(name)) => Ok(Some(Apply::named(name.as_str()))),
		Some(other) => Err(PdpError::Configuration(format!(
			"`apply` must name a combining algorithm, got {other}"
		))),
	}
}

fn parse_effect(map: &Map<String, Value>) -> Result<Effect> {
	match present(map, "effect") {
		None => Err(PdpError::MissingEffect),
		Some(Value::String(effect)) if effect.is_empty() => Err(PdpError::MissingEffect),
		Some(Value::String(effect)) => effect.parse(),
		Some(other) => Err(PdpError::InvalidEffect(other.to_string())),
	}
}
