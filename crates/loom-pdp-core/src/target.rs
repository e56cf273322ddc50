// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Targets: attribute predicates that decide whether a policy node applies.
//!
//! A [`Target`] is an OR over [`TargetElement`]s, and each element is an AND
//! over `(key, expected)` pairs. In policy documents:
//!
//! ```json
//! [
//!   { "credentials:username": "francisco", "credentials:group": "admin" },
//!   { "credentials:username": "francisco", "credentials:group": "writer" }
//! ]
//! ```
//!
//! applies to francisco when they are in the `admin` group or the `writer` group.
//! A single element may be written without the surrounding array.
//!
//! Expected values may be:
//! - a literal (`"writer"`, `true`, `3`, `null`)
//! - an array of literals or patterns, all of which must be found among the
//!   actual values
//! - `{ "pattern": "^articles:(writer|reader)$" }`, a regular expression
//! - `{ "field": "external:some-field" }`, another attribute whose resolved
//!   value becomes the expected value

use std::borrow::Cow;

use futures::future::{try_join, try_join_all};
use regex::Regex;
use serde_json::{Number, Value};
use tracing::trace;

use crate::error::{PdpError, Result};
use crate::key::AttributeKey;
use crate::router::AttributeRouter;

/// One expected value inside an [`Expected`] list.
#[derive(Debug, Clone)]
pub enum ExpectedItem {
	Literal(Value),
	Pattern(Regex),
}

impl ExpectedItem {
	pub fn pattern(pattern: &str) -> Result<Self> {
		Regex::new(pattern)
			.map(ExpectedItem::Pattern)
			.map_err(|e| PdpError::InvalidTarget(format!("invalid pattern {pattern:?}: {e}")))
	}

	/// Tests one actual value against this item.
	pub fn matches(&self, actual: &Value) -> bool {
		match self {
			ExpectedItem::Literal(expected) => values_equal(expected, actual),
			ExpectedItem::Pattern(re) => re.is_match(&text_of(actual)),
		}
	}

	fn from_json(value: &Value) -> Result<Self> {
		match value {
			Value::Object(map) => match map.get("pattern") {
				Some(Value::String(pattern)) if map.len() == 1 => Self::pattern(pattern),
				_ => Err(PdpError::InvalidTarget(format!(
					"unsupported expected value: {value}"
				))),
			},
			Value::Array(_) => Err(PdpError::InvalidTarget(format!(
				"nested arrays are not supported in expected values: {value}"
			))),
			scalar => Ok(ExpectedItem::Literal(scalar.clone())),
		}
	}
}

/// The expected side of a target pair.
#[derive(Debug, Clone)]
pub enum Expected {
	/// Resolve another attribute and use its value.
	Field(AttributeKey),
	/// Every item must match at least one actual value.
	Items(Vec<ExpectedItem>),
}

impl Expected {
	pub fn literal(value: impl Into<Value>) -> Self {
		Expected::from_value(value.into())
	}

	pub fn pattern(pattern: &str) -> Result<Self> {
		Ok(Expected::Items(vec![ExpectedItem::pattern(pattern)?]))
	}

	pub fn field(key: &str) -> Result<Self> {
		Ok(Expected::Field(AttributeKey::parse(key)?))
	}

	/// Builds literal items from a resolved value; arrays become one item per
	/// element.
	pub fn from_value(value: Value) -> Self {
		Expected::Items(into_items(value).into_iter().map(ExpectedItem::Literal).collect())
	}

	pub fn from_json(value: &Value) -> Result<Self> {
		match value {
			Value::Object(map) => {
				if let Some(field) = map.get("field") {
					return match field {
						Value::String(key) if map.len() == 1 => Self::field(key),
						_ => Err(PdpError::InvalidTarget(format!(
							"field reference must be {{\"field\": \"source:key\"}}, got {value}"
						))),
					};
				}
				Ok(Expected::Items(vec![ExpectedItem::from_json(value)?]))
			}
			Value::Array(items) => items
				.iter()
				.map(ExpectedItem::from_json)
				.collect::<Result<Vec<_>>>()
				.map(Expected::Items),
			scalar => Ok(Expected::Items(vec![ExpectedItem::Literal(scalar.clone())])),
		}
	}
}

impl From<Regex> for Expected {
	fn from(re: Regex) -> Self {
		Expected::Items(vec![ExpectedItem::Pattern(re)])
	}
}

/// A conjunction of attribute constraints.
#[derive(Debug, Clone, Default)]
pub struct TargetElement {
	pairs: Vec<(AttributeKey, Expected)>,
}

impl TargetElement {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a constraint on `key`.
	pub fn with(mut self, key: &str, expected: Expected) -> Result<Self> {
		self.pairs.push((AttributeKey::parse(key)?, expected));
		Ok(self)
	}

	pub fn pairs(&self) -> &[(AttributeKey, Expected)] {
		&self.pairs
	}

	pub fn from_json(value: &Value) -> Result<Self> {
		let Value::Object(map) = value else {
			return Err(PdpError::InvalidTarget(format!(
				"target element must be an object, got {value}"
			)));
		};

		let pairs = map
			.iter()
			.map(|(key, expected)| {
				Ok::<_, PdpError>((AttributeKey::parse(key)?, Expected::from_json(expected)?))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { pairs })
	}
}

/// A disjunction of [`TargetElement`]s. Never empty.
#[derive(Debug, Clone)]
pub struct Target {
	elements: Vec<TargetElement>,
}

impl Target {
	pub fn new(elements: Vec<TargetElement>) -> Result<Self> {
		if elements.is_empty() {
			return Err(PdpError::InvalidTarget(
				"the array in target should have at least one element".to_string(),
			));
		}
		Ok(Self { elements })
	}

	pub fn elements(&self) -> &[TargetElement] {
		&self.elements
	}

	pub fn from_json(value: &Value) -> Result<Self> {
		match value {
			Value::Array(elements) => Self::new(
				elements
					.iter()
					.map(TargetElement::from_json)
					.collect::<Result<Vec<_>>>()?,
			),
			Value::Object(_) => Ok(Self::from(TargetElement::from_json(value)?)),
			other => Err(PdpError::InvalidTarget(format!(
				"target must be an object or an array of objects, got {other}"
			))),
		}
	}
}

impl From<TargetElement> for Target {
	fn from(element: TargetElement) -> Self {
		Self {
			elements: vec![element],
		}
	}
}

/// Evaluates `target` against the attributes reachable through `router`.
///
/// An absent target always applies. All elements, and all pairs inside each
/// element, are evaluated concurrently; the first resolver error aborts the
/// whole evaluation.
pub async fn evaluate_target(target: Option<&Target>, router: &AttributeRouter) -> Result<bool> {
	let Some(target) = target else {
		return Ok(true);
	};

	let applies = try_join_all(
		target
			.elements
			.iter()
			.map(|element| evaluate_element(element, router)),
	)
	.await?;

	Ok(applies.into_iter().any(|a| a))
}

async fn evaluate_element(element: &TargetElement, router: &AttributeRouter) -> Result<bool> {
	let applies = try_join_all(
		element
			.pairs
			.iter()
			.map(|(key, expected)| evaluate_pair(key, expected, router)),
	)
	.await?;

	Ok(applies.into_iter().all(|a| a))
}

async fn evaluate_pair(
	key: &AttributeKey,
	expected: &Expected,
	router: &AttributeRouter,
) -> Result<bool> {
	let (expected, actual) = try_join(expected_items(expected, router), router.resolve(key, None)).await?;
	let actual = into_items(actual.unwrap_or(Value::Null));
	let matched = target_applies(&expected, &actual);
	trace!(key = %key, matched, "target pair evaluated");
	Ok(matched)
}

async fn expected_items<'a>(
	expected: &'a Expected,
	router: &AttributeRouter,
) -> Result<Cow<'a, [ExpectedItem]>> {
	match expected {
		Expected::Items(items) => Ok(Cow::Borrowed(items.as_slice())),
		Expected::Field(field) => {
			let value = router.resolve(field, None).await?.unwrap_or(Value::Null);
			Ok(Cow::Owned(
				into_items(value).into_iter().map(ExpectedItem::Literal).collect(),
			))
		}
	}
}

/// Every expected item must match at least one actual value.
pub fn target_applies(expected: &[ExpectedItem], actual: &[Value]) -> bool {
	expected
		.iter()
		.all(|item| actual.iter().any(|value| item.matches(value)))
}

fn into_items(value: Value) -> Vec<Value> {
	match value {
		Value::Array(items) => items,
		other => vec![other],
	}
}

fn values_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
		_ => a == b,
	}
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
	if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
		return x == y;
	}
	if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
		return x == y;
	}
	a.as_f64() == b.as_f64()
}

fn text_of(value: &Value) -> Cow<'_, str> {
	match value {
		Value::String(s) => Cow::Borrowed(s.as_str()),
		other => Cow::Owned(other.to_string()),
	}
}
