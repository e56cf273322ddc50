// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute router behaviour through the public API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use loom_pdp_core::{
	AttributeRouter, AttributeSource, BoxError, PdpError, RegisterOptions, Resolver,
	RouterOptions,
};
use serde_json::{json, Value};

/// Answers `profile:<field>` from an in-memory table keyed by the request's
/// `username`.
struct ProfileStore {
	profiles: HashMap<String, Value>,
}

#[async_trait]
impl AttributeSource for ProfileStore {
	async fn resolve(
		&self,
		_source: &str,
		key: &str,
		context: Option<&Value>,
	) -> Result<Value, BoxError> {
		let username = context
			.and_then(|c| c.get("username"))
			.and_then(Value::as_str)
			.ok_or("request has no username")?;
		Ok(self
			.profiles
			.get(username)
			.and_then(|profile| profile.get(key))
			.cloned()
			.unwrap_or(Value::Null))
	}
}

fn root() -> Arc<AttributeRouter> {
	let mut router = AttributeRouter::new();
	router
		.register(
			"profile",
			Resolver::from_source(ProfileStore {
				profiles: HashMap::from([
					("alice".to_string(), json!({ "team": "platform" })),
					("bob".to_string(), json!({ "team": "billing" })),
				]),
			}),
		)
		.unwrap();
	router
		.register(
			["credentials", "session"],
			Resolver::sync(|source, key, context| {
				Ok(context
					.and_then(|c| c.get(key))
					.map(|v| json!(format!("{source}/{v}")))
					.unwrap_or(Value::Null))
			}),
		)
		.unwrap();
	Arc::new(router)
}

#[tokio::test]
async fn concurrent_requests_see_their_own_context() {
	let root = root();
	let alice = root.create_child(Some(json!({ "username": "alice" })));
	let bob = root.create_child(Some(json!({ "username": "bob" })));

	let (a, b) = tokio::join!(alice.get("profile:team", None), bob.get("profile:team", None));
	assert_eq!(a.unwrap(), Some(json!("platform")));
	assert_eq!(b.unwrap(), Some(json!("billing")));
}

#[tokio::test]
async fn one_resolver_serves_several_sources() {
	let request = root().create_child(Some(json!({ "id": 7 })));

	assert_eq!(request.get("credentials:id", None).await.unwrap(), Some(json!("credentials/7")));
	assert_eq!(request.get("session:id", None).await.unwrap(), Some(json!("session/7")));
	assert_eq!(request.get("id", None).await.unwrap(), Some(json!("credentials/7")));
}

#[tokio::test]
async fn explicit_context_wins_over_bound_context() {
	let request = root().create_child(Some(json!({ "username": "alice" })));
	let other = json!({ "username": "bob" });

	let team = request.get("profile:team", Some(&other)).await.unwrap();
	assert_eq!(team, Some(json!("billing")));
}

#[tokio::test]
async fn async_source_errors_are_reported_with_key() {
	let request = root().create_child(None);

	let err = request.get("profile:team", None).await.unwrap_err();
	match err {
		PdpError::ResolverFailed { key, source } => {
			assert_eq!(key, "profile:team");
			assert_eq!(source.to_string(), "request has no username");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn duplicate_registration_names_the_source() {
	let mut router = AttributeRouter::with_options(RouterOptions {
		allow_override: false,
	});
	router
		.register(["a", "b", "c"], Resolver::sync(|_, _, _| Ok(json!(1))))
		.unwrap();

	let err = router
		.register(["b", "d"], Resolver::sync(|_, _, _| Ok(json!(2))))
		.unwrap_err();
	assert_eq!(
		err.to_string(),
		"there is a resolver already registered for the source: b"
	);
	assert_eq!(router.sources(), vec!["a", "b", "c"]);

	router
		.register_with(
			["b", "d"],
			Resolver::sync(|_, _, _| Ok(json!(2))),
			RegisterOptions {
				allow_override: true,
			},
		)
		.unwrap();
	assert_eq!(router.sources(), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn children_inherit_options_and_chain() {
	let root = Arc::new(AttributeRouter::with_options(RouterOptions {
		allow_override: true,
	}));
	let child = Arc::new(root.create_child(None));
	let grandchild = child.create_child(Some(json!({})));

	assert!(grandchild.options().allow_override);
	assert!(grandchild.parent().is_some());
	assert!(!grandchild.has_resolver("credentials"));
	assert_eq!(grandchild.get("credentials:x", None).await.unwrap(), None);
}
