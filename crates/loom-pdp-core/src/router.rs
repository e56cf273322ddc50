// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute resolution router.
//!
//! An [`AttributeRouter`] maps the `source` part of an [`AttributeKey`] to a
//! registered [`Resolver`]. Sources that are not registered locally are looked
//! up in the parent router, so a process can register its resolvers once on a
//! root router and hand every request a cheap child bound to that request's
//! context:
//!
//! ```
//! use std::sync::Arc;
//! use loom_pdp_core::{AttributeRouter, Resolver};
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let mut root = AttributeRouter::new();
//! root.register(
//!     "credentials",
//!     Resolver::sync(|_source, key, context| {
//!         Ok(context.and_then(|c| c.get(key)).cloned().unwrap_or(Value::Null))
//!     }),
//! )
//! .unwrap();
//!
//! let root = Arc::new(root);
//! let request = root.create_child(Some(json!({ "username": "alice" })));
//! let username = request.get("credentials:username", None).await.unwrap();
//! assert_eq!(username, Some(json!("alice")));
//! # });
//! ```
//!
//! Lookups are never cached; every call to [`AttributeRouter::get`] walks the
//! parent chain again.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{BoxError, PdpError, Result};
use crate::key::AttributeKey;

type SyncResolveFn =
	dyn Fn(&str, &str, Option<&Value>) -> std::result::Result<Value, BoxError> + Send + Sync;

/// An asynchronous attribute resolver.
///
/// Implement this for resolvers that need to await something (a database, a
/// session store, another service). Simple lookups can use
/// [`Resolver::sync`] instead.
#[async_trait]
pub trait AttributeSource: Send + Sync {
	async fn resolve(
		&self,
		source: &str,
		key: &str,
		context: Option<&Value>,
	) -> std::result::Result<Value, BoxError>;
}

/// A resolver bound to one or more sources of a router.
#[derive(Clone)]
pub enum Resolver {
	Sync(Arc<SyncResolveFn>),
	Async(Arc<dyn AttributeSource>),
}

impl Resolver {
	/// Wraps a function that answers immediately.
	pub fn sync<F>(f: F) -> Self
	where
		F: Fn(&str, &str, Option<&Value>) -> std::result::Result<Value, BoxError>
			+ Send
			+ Sync
			+ 'static,
	{
		Resolver::Sync(Arc::new(f))
	}

	/// Wraps an [`AttributeSource`] implementation.
	pub fn from_source<S>(source: S) -> Self
	where
		S: AttributeSource + 'static,
	{
		Resolver::Async(Arc::new(source))
	}

	/// Wraps a closure returning a future. Arguments are passed owned so the
	/// future can outlive the call.
	pub fn from_async_fn<F, Fut>(f: F) -> Self
	where
		F: Fn(String, String, Option<Value>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = std::result::Result<Value, BoxError>> + Send + 'static,
	{
		Self::from_source(AsyncFnSource(f))
	}

	async fn resolve(
		&self,
		source: &str,
		key: &str,
		context: Option<&Value>,
	) -> std::result::Result<Value, BoxError> {
		match self {
			Resolver::Sync(f) => f(source, key, context),
			Resolver::Async(s) => s.resolve(source, key, context).await,
		}
	}
}

impl fmt::Debug for Resolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Resolver::Sync(_) => f.write_str("Resolver::Sync"),
			Resolver::Async(_) => f.write_str("Resolver::Async"),
		}
	}
}

struct AsyncFnSource<F>(F);

#[async_trait]
impl<F, Fut> AttributeSource for AsyncFnSource<F>
where
	F: Fn(String, String, Option<Value>) -> Fut + Send + Sync,
	Fut: Future<Output = std::result::Result<Value, BoxError>> + Send,
{
	async fn resolve(
		&self,
		source: &str,
		key: &str,
		context: Option<&Value>,
	) -> std::result::Result<Value, BoxError> {
		(self.0)(source.to_string(), key.to_string(), context.cloned()).await
	}
}

/// One or more source names to register a resolver for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources(Vec<String>);

impl Sources {
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl From<&str> for Sources {
	fn from(source: &str) -> Self {
		Sources(vec![source.to_string()])
	}
}

impl From<String> for Sources {
	fn from(source: String) -> Self {
		Sources(vec![source])
	}
}

impl From<Vec<String>> for Sources {
	fn from(sources: Vec<String>) -> Self {
		Sources(sources)
	}
}

impl From<Vec<&str>> for Sources {
	fn from(sources: Vec<&str>) -> Self {
		Sources(sources.into_iter().map(str::to_string).collect())
	}
}

impl From<&[&str]> for Sources {
	fn from(sources: &[&str]) -> Self {
		Sources(sources.iter().map(|s| s.to_string()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for Sources {
	fn from(sources: [&str; N]) -> Self {
		Sources(sources.iter().map(|s| s.to_string()).collect())
	}
}

/// Router-wide defaults, inherited by children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
	/// Whether [`AttributeRouter::register`] may replace an existing resolver.
	pub allow_override: bool,
}

/// Per-registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
	pub allow_override: bool,
}

/// Hierarchical registry of attribute resolvers.
#[derive(Debug, Default)]
pub struct AttributeRouter {
	options: RouterOptions,
	resolvers: HashMap<String, Resolver>,
	parent: Option<Arc<AttributeRouter>>,
	context: Option<Value>,
}

impl AttributeRouter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_options(options: RouterOptions) -> Self {
		Self {
			options,
			..Self::default()
		}
	}

	/// Creates a router bound to `context` that delegates unknown sources to
	/// `self`. The parent is shared, never modified.
	pub fn create_child(self: &Arc<Self>, context: Option<Value>) -> AttributeRouter {
		AttributeRouter {
			options: self.options,
			resolvers: HashMap::new(),
			parent: Some(Arc::clone(self)),
			context,
		}
	}

	pub fn options(&self) -> RouterOptions {
		self.options
	}

	pub fn context(&self) -> Option<&Value> {
		self.context.as_ref()
	}

	pub fn parent(&self) -> Option<&Arc<AttributeRouter>> {
		self.parent.as_ref()
	}

	/// Registers `resolver` using the router's default override policy.
	pub fn register(
		&mut self,
		sources: impl Into<Sources>,
		resolver: Resolver,
	) -> Result<&mut Self> {
		let options = RegisterOptions {
			allow_override: self.options.allow_override,
		};
		self.register_with(sources, resolver, options)
	}

	/// Registers `resolver` for every name in `sources`.
	///
	/// Nothing is registered if any name is empty, or if any name already
	/// has a resolver and `options.allow_override` is false.
	pub fn register_with(
		&mut self,
		sources: impl Into<Sources>,
		resolver: Resolver,
		options: RegisterOptions,
	) -> Result<&mut Self> {
		let sources = sources.into();
		if sources.0.is_empty() {
			return Err(PdpError::Configuration(
				"resolver registration needs at least one source".to_string(),
			));
		}

		let mut seen = HashSet::new();
		for source in sources.iter() {
			if source.is_empty() {
				return Err(PdpError::Configuration(
					"resolver source name must not be empty".to_string(),
				));
			}
			let repeated = !seen.insert(source);
			if !options.allow_override && (repeated || self.resolvers.contains_key(source)) {
				return Err(PdpError::DuplicateResolver(source.to_string()));
			}
		}

		for source in sources.0 {
			debug!(
				source = %source,
				allow_override = options.allow_override,
				"registering attribute resolver"
			);
			self.resolvers.insert(source, resolver.clone());
		}

		Ok(self)
	}

	/// Source names registered on this router (not its ancestors).
	pub fn sources(&self) -> Vec<&str> {
		let mut sources: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
		sources.sort_unstable();
		sources
	}

	/// Whether this router or any ancestor can answer `source`.
	pub fn has_resolver(&self, source: &str) -> bool {
		self.resolvers.contains_key(source)
			|| self
				.parent
				.as_ref()
				.is_some_and(|parent| parent.has_resolver(source))
	}

	/// Looks up `key` (`source:subkey`, or a bare `subkey` of `credentials`).
	///
	/// Returns `Ok(None)` when no router in the chain has a resolver for the
	/// source. A `null` context counts as no context.
	pub async fn get<'a>(&'a self, key: &str, context: Option<&'a Value>) -> Result<Option<Value>> {
		let key = AttributeKey::parse(key)?;
		self.resolve(&key, context).await
	}

	/// Same as [`get`](Self::get) for an already parsed key.
	pub async fn resolve<'a>(
		&'a self,
		key: &AttributeKey,
		context: Option<&'a Value>,
	) -> Result<Option<Value>> {
		let mut router = self;
		let mut context = context;

		loop {
			let bound = context
				.filter(|c| !c.is_null())
				.or(router.context.as_ref().filter(|c| !c.is_null()));

			if let Some(resolver) = router.resolvers.get(key.source()) {
				trace!(source = key.source(), subkey = key.subkey(), "resolving attribute");
				return match resolver.resolve(key.source(), key.subkey(), bound).await {
					Ok(value) => Ok(Some(value)),
					Err(source) => {
						warn!(key = %key, error = %source, "attribute resolver failed");
						Err(PdpError::ResolverFailed {
							key: key.to_string(),
							source,
						})
					}
				};
			}

			match router.parent.as_deref() {
				Some(parent) => {
					trace!(source = key.source(), "delegating lookup to parent router");
					context = bound;
					router = parent;
				}
				None => {
					trace!(source = key.source(), "no resolver registered for source");
					return Ok(None);
				}
			}
		}
	}
}
