// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Target matching against resolved attributes.

use std::sync::Arc;

use loom_pdp_core::{evaluate_target, AttributeRouter, PdpError, Resolver, Target};
use serde_json::{json, Value};

fn context_lookup() -> Resolver {
	Resolver::sync(|_, key, context| {
		Ok(context.and_then(|c| c.get(key)).cloned().unwrap_or(Value::Null))
	})
}

fn root() -> Arc<AttributeRouter> {
	let mut router = AttributeRouter::new();
	router.register("credentials", context_lookup()).unwrap();
	router
		.register(
			"external",
			Resolver::sync(|_, key, _| {
				Ok(match key {
					"some-field-name" => json!("some-field-value"),
					_ => Value::Null,
				})
			}),
		)
		.unwrap();
	Arc::new(router)
}

async fn applies(target: Value, information: Value) -> bool {
	let target = Target::from_json(&target).unwrap();
	let router = root().create_child(Some(information));
	evaluate_target(Some(&target), &router).await.unwrap()
}

// ============================================================================
// AND
// ============================================================================

fn writer_and_premium() -> Value {
	json!({ "credentials:group": "writer", "credentials:premium": true })
}

#[tokio::test]
async fn and_full_match_applies() {
	let information = json!({ "username": "user00001", "group": ["writer"], "premium": true });
	assert!(applies(writer_and_premium(), information).await);
}

#[tokio::test]
async fn and_partial_match_does_not_apply() {
	let information = json!({ "username": "user00002", "group": ["writer"], "premium": false });
	assert!(!applies(writer_and_premium(), information).await);
}

#[tokio::test]
async fn and_no_match_does_not_apply() {
	let information = json!({ "username": "user00003", "group": ["reader"], "premium": false });
	assert!(!applies(writer_and_premium(), information).await);
}

// ============================================================================
// AND with patterns
// ============================================================================

fn articles_member() -> Value {
	json!({
		"credentials:group": { "pattern": "^articles:(writer|reader)$" },
		"credentials:premium": true
	})
}

#[tokio::test]
async fn pattern_matches_any_listed_group() {
	for group in ["articles:writer", "articles:reader"] {
		let information = json!({ "group": [group], "premium": true });
		assert!(applies(articles_member(), information).await, "{group}");
	}
}

#[tokio::test]
async fn pattern_mismatch_does_not_apply() {
	let partial = json!({ "group": ["articles:other"], "premium": true });
	assert!(!applies(articles_member(), partial).await);

	let none = json!({ "group": ["articles:other"], "premium": false });
	assert!(!applies(articles_member(), none).await);
}

// ============================================================================
// Field references
// ============================================================================

fn writer_with_external_field() -> Value {
	json!({
		"credentials:group": "writer",
		"credentials:some-field": { "field": "external:some-field-name" }
	})
}

#[tokio::test]
async fn field_reference_full_match_applies() {
	let information = json!({ "group": ["writer"], "some-field": "some-field-value" });
	assert!(applies(writer_with_external_field(), information).await);
}

#[tokio::test]
async fn field_reference_mismatch_does_not_apply() {
	let partial = json!({ "group": ["writer"], "some-field": "bad-field-value" });
	assert!(!applies(writer_with_external_field(), partial).await);

	let none = json!({ "group": ["reader"], "some-field": "bad-field-value" });
	assert!(!applies(writer_with_external_field(), none).await);
}

// ============================================================================
// OR
// ============================================================================

fn any_of_three() -> Value {
	json!([
		{ "credentials:group": "writer" },
		{ "credentials:premium": true },
		{ "credentials:username": "user00002" }
	])
}

#[tokio::test]
async fn or_applies_when_some_element_matches() {
	let partial = json!({ "username": "user00001", "group": ["writer"], "premium": true });
	assert!(applies(any_of_three(), partial).await);

	let full = json!({ "username": "user00002", "group": ["writer"], "premium": true });
	assert!(applies(any_of_three(), full).await);
}

#[tokio::test]
async fn or_does_not_apply_when_no_element_matches() {
	let information = json!({ "username": "user00003", "group": ["reader"], "premium": false });
	assert!(!applies(any_of_three(), information).await);
}

// ============================================================================
// Full coverage and edge cases
// ============================================================================

#[tokio::test]
async fn every_expected_value_must_be_present() {
	let target = json!({ "credentials:group": ["administrator", "publisher"] });

	let both = json!({ "group": ["publisher", "writer", "administrator"] });
	assert!(applies(target.clone(), both).await);

	let one = json!({ "group": ["publisher"] });
	assert!(!applies(target, one).await);
}

#[tokio::test]
async fn unset_attribute_matches_only_null() {
	assert!(applies(json!({ "credentials:blocked": null }), json!({})).await);
	assert!(!applies(json!({ "credentials:blocked": false }), json!({})).await);
}

#[tokio::test]
async fn bare_keys_use_credentials() {
	assert!(applies(json!({ "group": "writer" }), json!({ "group": "writer" })).await);
}

#[tokio::test]
async fn unregistered_source_does_not_apply() {
	assert!(!applies(json!({ "nowhere:group": "writer" }), json!({ "group": "writer" })).await);
}

#[tokio::test]
async fn absent_target_applies() {
	let router = root().create_child(None);
	assert!(evaluate_target(None, &router).await.unwrap());
}

#[test]
fn empty_target_array_is_invalid() {
	assert!(matches!(Target::from_json(&json!([])), Err(PdpError::InvalidTarget(_))));
}

#[test]
fn malformed_keys_are_invalid() {
	assert!(matches!(
		Target::from_json(&json!({ ":group": "writer" })),
		Err(PdpError::InvalidKey(_))
	));
	assert!(matches!(
		Target::from_json(&json!({ "credentials:group": { "pattern": "(" } })),
		Err(PdpError::InvalidTarget(_))
	));
}

#[tokio::test]
async fn resolver_error_fails_the_target() {
	let mut root = AttributeRouter::new();
	root.register("credentials", Resolver::sync(|_, _, _| Err("no session".into())))
		.unwrap();
	let router = Arc::new(root).create_child(None);

	let target = Target::from_json(&json!({ "credentials:group": "writer" })).unwrap();
	let err = evaluate_target(Some(&target), &router).await.unwrap_err();
	assert!(matches!(err, PdpError::ResolverFailed { ref key, .. } if key == "credentials:group"));
}
