// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Combining algorithms.
//!
//! - `permit-overrides` (default): permit if any child permits, otherwise deny
//! - `deny-overrides`: deny if any child denies, otherwise permit
//!
//! Both yield [`Decision::Undetermined`] when there are no children. Callers can
//! register further algorithms in a [`CombinatorRegistry`] or attach a custom
//! [`Combinator`] directly to a policy node.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture};

use crate::decision::Decision;
use crate::error::{PdpError, Result};

pub const PERMIT_OVERRIDES: &str = "permit-overrides";
pub const DENY_OVERRIDES: &str = "deny-overrides";

/// A pending evaluation of one child node.
pub type ChildEvaluation<'a> = BoxFuture<'a, Result<Decision>>;

/// Folds the decisions of a node's children into one decision.
///
/// A child that fails fails the whole combination; an error never counts as
/// a decision.
#[async_trait]
pub trait Combinator: Send + Sync {
	async fn combine<'a>(&self, children: Vec<ChildEvaluation<'a>>) -> Result<Decision>;
}

/// Permit if any decision is `Permit`, otherwise `Deny`.
pub fn permit_overrides(decisions: &[Decision]) -> Decision {
	if decisions.is_empty() {
		return Decision::Undetermined;
	}
	if decisions.contains(&Decision::Permit) {
		Decision::Permit
	} else {
		Decision::Deny
	}
}

/// Deny if any decision is `Deny`, otherwise `Permit`.
pub fn deny_overrides(decisions: &[Decision]) -> Decision {
	if decisions.is_empty() {
		return Decision::Undetermined;
	}
	if decisions.contains(&Decision::Deny) {
		Decision::Deny
	} else {
		Decision::Permit
	}
}

/// Runs every child concurrently, then applies a pure fold.
pub struct FoldCombinator<F> {
	fold: F,
}

impl<F> FoldCombinator<F>
where
	F: Fn(&[Decision]) -> Decision + Send + Sync,
{
	pub fn new(fold: F) -> Self {
		Self { fold }
	}
}

#[async_trait]
impl<F> Combinator for FoldCombinator<F>
where
	F: Fn(&[Decision]) -> Decision + Send + Sync,
{
	async fn combine<'a>(&self, children: Vec<ChildEvaluation<'a>>) -> Result<Decision> {
		if children.is_empty() {
			return Ok(Decision::Undetermined);
		}
		let decisions = try_join_all(children).await?;
		Ok((self.fold)(&decisions))
	}
}

/// Named combining algorithms.
#[derive(Clone)]
pub struct CombinatorRegistry {
	combinators: HashMap<String, Arc<dyn Combinator>>,
}

impl CombinatorRegistry {
	/// A registry without any algorithm, not even the built-in ones.
	pub fn empty() -> Self {
		Self {
			combinators: HashMap::new(),
		}
	}

	/// Adds or replaces the algorithm registered under `name`.
	pub fn register(&mut self, name: impl Into<String>, combinator: Arc<dyn Combinator>) -> &mut Self {
		let name = name.into();
		tracing::debug!(combinator = %name, "registering combining algorithm");
		self.combinators.insert(name, combinator);
		self
	}

	pub fn get(&self, name: &str) -> Result<Arc<dyn Combinator>> {
		self.combinators
			.get(name)
			.cloned()
			.ok_or_else(|| PdpError::UnknownCombinator(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.combinators.contains_key(name)
	}

	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.combinators.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}
}

impl Default for CombinatorRegistry {
	fn default() -> Self {
		let mut registry = Self::empty();
		registry
			.register(PERMIT_OVERRIDES, Arc::new(FoldCombinator::new(permit_overrides)))
			.register(DENY_OVERRIDES, Arc::new(FoldCombinator::new(deny_overrides)));
		registry
	}
}

impl fmt::Debug for CombinatorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CombinatorRegistry")
			.field("names", &self.names())
			.finish()
	}
}

/// The `apply` field of a policy node.
#[derive(Clone)]
pub enum Apply {
	/// Looked up in the evaluator's registry on every evaluation.
	Named(String),
	Custom(Arc<dyn Combinator>),
}

impl Apply {
	pub fn named(name: impl Into<String>) -> Self {
		Apply::Named(name.into())
	}

	pub fn custom<C>(combinator: C) -> Self
	where
		C: Combinator + 'static,
	{
		Apply::Custom(Arc::new(combinator))
	}

	/// Resolves to a combinator using `registry` for names.
	pub fn resolve(&self, registry: &CombinatorRegistry) -> Result<Arc<dyn Combinator>> {
		match self {
			Apply::Named(name) => registry.get(name),
			Apply::Custom(combinator) => Ok(Arc::clone(combinator)),
		}
	}
}

impl From<&str> for Apply {
	fn from(name: &str) -> Self {
		Apply::named(name)
	}
}

impl fmt::Debug for Apply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Apply::Named(name) => f.debug_tuple("Named").field(name).finish(),
			Apply::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::FutureExt;
	use proptest::prelude::*;
	use Decision::{Deny, Permit, Undetermined};

	fn ready(decisions: &[Decision]) -> Vec<ChildEvaluation<'static>> {
		decisions
			.iter()
			.map(|d| {
				let d = *d;
				async move { Ok::<_, PdpError>(d) }.boxed()
			})
			.collect()
	}

	fn decision_strategy() -> impl Strategy<Value = Decision> {
		prop_oneof![Just(Permit), Just(Deny), Just(Undetermined)]
	}

	#[test]
	fn permit_overrides_folds() {
		assert_eq!(permit_overrides(&[Deny, Undetermined]), Deny);
		assert_eq!(permit_overrides(&[Deny, Permit]), Permit);
		assert_eq!(permit_overrides(&[Undetermined]), Deny);
		assert_eq!(permit_overrides(&[]), Undetermined);
	}

	#[test]
	fn deny_overrides_folds() {
		assert_eq!(deny_overrides(&[Permit, Undetermined]), Permit);
		assert_eq!(deny_overrides(&[Permit, Deny]), Deny);
		assert_eq!(deny_overrides(&[Undetermined]), Permit);
		assert_eq!(deny_overrides(&[]), Undetermined);
	}

	#[tokio::test]
	async fn built_ins_are_registered() {
		let registry = CombinatorRegistry::default();
		assert_eq!(registry.names(), vec![DENY_OVERRIDES, PERMIT_OVERRIDES]);

		let permit = registry.get(PERMIT_OVERRIDES).unwrap();
		assert_eq!(permit.combine(ready(&[Deny, Permit])).await.unwrap(), Permit);
		assert_eq!(permit.combine(Vec::new()).await.unwrap(), Undetermined);

		let deny = registry.get(DENY_OVERRIDES).unwrap();
		assert_eq!(deny.combine(ready(&[Permit, Deny])).await.unwrap(), Deny);
	}

	#[test]
	fn unknown_name_is_an_error() {
		let registry = CombinatorRegistry::default();
		assert!(matches!(
			registry.get("first-applicable"),
			Err(PdpError::UnknownCombinator(name)) if name == "first-applicable"
		));
		assert!(matches!(
			Apply::named("only-one-applicable").resolve(&registry),
			Err(PdpError::UnknownCombinator(_))
		));
	}

	#[tokio::test]
	async fn child_failure_fails_combination() {
		let registry = CombinatorRegistry::default();
		let children: Vec<ChildEvaluation<'static>> = vec![
			async { Ok::<_, PdpError>(Permit) }.boxed(),
			async { Err::<Decision, _>(PdpError::Configuration("broken child".to_string())) }.boxed(),
		];

		let err = registry
			.get(PERMIT_OVERRIDES)
			.unwrap()
			.combine(children)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("broken child"));
	}

	#[tokio::test]
	async fn custom_fold_can_be_registered() {
		let mut registry = CombinatorRegistry::empty();
		registry.register(
			"first-applicable",
			Arc::new(FoldCombinator::new(|decisions: &[Decision]| {
				decisions
					.iter()
					.copied()
					.find(|d| *d != Undetermined)
					.unwrap_or(Undetermined)
			})),
		);

		let first = Apply::named("first-applicable").resolve(&registry).unwrap();
		assert_eq!(first.combine(ready(&[Undetermined, Deny, Permit])).await.unwrap(), Deny);
		assert!(registry.get(PERMIT_OVERRIDES).is_err());
	}

	proptest! {
		#[test]
		fn permit_overrides_permits_iff_any_permit(decisions in prop::collection::vec(decision_strategy(), 1..10)) {
			let expected = if decisions.contains(&Permit) { Permit } else { Deny };
			prop_assert_eq!(permit_overrides(&decisions), expected);
		}

		#[test]
		fn deny_overrides_denies_iff_any_deny(decisions in prop::collection::vec(decision_strategy(), 1..10)) {
			let expected = if decisions.contains(&Deny) { Deny } else { Permit };
			prop_assert_eq!(deny_overrides(&decisions), expected);
		}

		#[test]
		fn folds_ignore_order(mut decisions in prop::collection::vec(decision_strategy(), 0..10)) {
			let permit = permit_overrides(&decisions);
			let deny = deny_overrides(&decisions);
			decisions.reverse();
			prop_assert_eq!(permit_overrides(&decisions), permit);
			prop_assert_eq!(deny_overrides(&decisions), deny);
		}
	}
}
