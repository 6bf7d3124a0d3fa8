//! Field resolution across full builds: precedence, memoization, cycles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use forgery_core::{
	Factory, FactoryDefinition, FactoryError, FieldSpec, Overrides, SequenceRegistry, Trait,
};
use parking_lot::Mutex;
use rstest::*;
use serde_json::{Value, json};

fn isolated() -> Arc<SequenceRegistry> {
	Arc::new(SequenceRegistry::new())
}

#[fixture]
fn images() -> Factory {
	FactoryDefinition::builder("Image")
		.field("id", FieldSpec::sequence(|n| format!("Image-{n}")))
		.field("width", 100)
		.field("height", 100)
		.field("url", "default.png")
		.with_trait(Trait::new("large").field("width", 256).field("height", 256))
		.with_trait(Trait::new("wide").field("width", 1024))
		.with_trait(Trait::new("avatar").field("url", "X"))
		.sequences(isolated())
		.build()
		.unwrap()
}

/// Test that call-level overrides beat traits and traits beat defaults
#[rstest]
#[tokio::test]
async fn test_override_precedence(images: Factory) {
	let image = images.build().await.unwrap();
	assert_eq!(image.get("width"), Some(&json!(100)));

	let large = images.use_trait("large").unwrap();
	let image = large.build().await.unwrap();
	assert_eq!(image.get("width"), Some(&json!(256)));

	// Latest-selected trait wins
	let image = large.use_trait("wide").unwrap().build().await.unwrap();
	assert_eq!(image.get("width"), Some(&json!(1024)));
	assert_eq!(image.get("height"), Some(&json!(256)));

	let image = large
		.use_trait("wide")
		.unwrap()
		.build_with(&Overrides::new().set("width", 8))
		.await
		.unwrap();
	assert_eq!(image.get("width"), Some(&json!(8)));
}

/// Test that stacking two traits merges both overlays with the remaining defaults
#[rstest]
#[tokio::test]
async fn test_trait_stacking(images: Factory) {
	let image = images
		.use_trait("large")
		.unwrap()
		.use_trait("avatar")
		.unwrap()
		.build()
		.await
		.unwrap();

	assert_eq!(
		image.into_json(),
		json!({"id": "Image-0", "width": 256, "height": 256, "url": "X"})
	);
}

/// Test that selecting the same trait twice is legal
#[rstest]
fn test_repeated_trait_selection(images: Factory) {
	let stacked = images.with_traits(["large", "avatar", "large"]).unwrap();
	assert_eq!(stacked.selected_traits(), ["large", "avatar", "large"]);
}

/// Test that an explicit undefined override beats a lazy default
#[rstest]
#[tokio::test]
async fn test_explicit_undefined_override() {
	let factory = FactoryDefinition::builder("User")
		.field("name", "Komata")
		.field(
			"email",
			FieldSpec::lazy(|ctx| async move { Ok(format!("user{}@example.com", ctx.seq())) }),
		)
		.with_trait(Trait::new("named").field("name", "Mikami"))
		.sequences(isolated())
		.build()
		.unwrap();

	let user = factory
		.use_trait("named")
		.unwrap()
		.build_with(&Overrides::new().undefined("email").undefined("name"))
		.await
		.unwrap();

	assert!(user.is_undefined("email"));
	assert!(user.is_undefined("name"));
	// Undefined keys are omitted from the JSON view
	assert_eq!(user.into_json(), json!({}));
}

/// Test that null is a defined value distinct from undefined
#[rstest]
#[tokio::test]
async fn test_null_is_not_undefined() {
	let factory = FactoryDefinition::builder("User")
		.field("deletedAt", Value::Null)
		.sequences(isolated())
		.build()
		.unwrap();

	let user = factory.build().await.unwrap();

	assert!(!user.is_undefined("deletedAt"));
	assert_eq!(user.get("deletedAt"), Some(&Value::Null));
}

/// Test that a resolver read by two fields runs exactly once per build
#[rstest]
#[tokio::test]
async fn test_memoization_across_dependents() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);

	let factory = FactoryDefinition::builder("Account")
		.field(
			"token",
			FieldSpec::lazy(move |_| {
				let counter = Arc::clone(&counter);
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
					Ok("secret")
				}
			}),
		)
		.field(
			"header",
			FieldSpec::lazy(|ctx| async move {
				let token: Option<String> = ctx.get_as("token").await?;
				Ok(format!("Bearer {}", token.unwrap_or_default()))
			}),
		)
		.field(
			"query",
			FieldSpec::lazy(|ctx| async move {
				let token: Option<String> = ctx.get_as("token").await?;
				Ok(format!("?token={}", token.unwrap_or_default()))
			}),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	let account = factory.build().await.unwrap();
	assert_eq!(account.get("header"), Some(&json!("Bearer secret")));
	assert_eq!(account.get("query"), Some(&json!("?token=secret")));
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	// A fresh build gets a fresh cache
	factory.build().await.unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test that evaluation follows first-touch order, not declaration order
#[rstest]
#[tokio::test]
async fn test_first_touch_evaluation_order() {
	let order = Arc::new(Mutex::new(Vec::new()));

	let record = |name: &'static str, order: &Arc<Mutex<Vec<&'static str>>>| {
		let order = Arc::clone(order);
		FieldSpec::lazy(move |_| {
			let order = Arc::clone(&order);
			async move {
				order.lock().push(name);
				Ok(name)
			}
		})
	};

	let depends = {
		let order = Arc::clone(&order);
		FieldSpec::lazy(move |ctx| {
			let order = Arc::clone(&order);
			async move {
				ctx.get("c").await?;
				order.lock().push("a");
				Ok("a")
			}
		})
	};

	let factory = FactoryDefinition::builder("Ordered")
		.field("a", depends)
		.field("b", record("b", &order))
		.field("c", record("c", &order))
		.sequences(isolated())
		.build()
		.unwrap();

	let result = factory.build().await.unwrap();

	assert_eq!(*order.lock(), vec!["c", "a", "b"]);
	assert_eq!(result.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

/// Test that transient fields feed resolvers but never reach the output
#[rstest]
#[tokio::test]
async fn test_transient_exclusion() {
	let factory = FactoryDefinition::builder("User")
		.transient("domain", "example.com")
		.transient(
			"unused",
			FieldSpec::lazy(|_| async move {
				Err::<Value, _>(anyhow::anyhow!("transient fields are resolved lazily"))
			}),
		)
		.field(
			"email",
			FieldSpec::lazy(|ctx| async move {
				let domain: Option<String> = ctx.get_as("domain").await?;
				Ok(format!("user{}@{}", ctx.seq(), domain.unwrap_or_default()))
			}),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	let user = factory
		.build_with(&Overrides::new().set("domain", "corp.test"))
		.await
		.unwrap();

	assert_eq!(user.keys().collect::<Vec<_>>(), vec!["email"]);
	assert!(!user.contains_key("domain"));
	assert!(!user.contains_key("unused"));
	assert_eq!(user.get("email"), Some(&json!("user0@corp.test")));
}

/// Test that mutual `get` calls fail with a circular dependency error
#[rstest]
#[tokio::test]
async fn test_circular_dependency() {
	let factory = FactoryDefinition::builder("Loop")
		.field("ping", FieldSpec::lazy(|ctx| async move { Ok(ctx.get("pong").await?) }))
		.field("pong", FieldSpec::lazy(|ctx| async move { Ok(ctx.get("ping").await?) }))
		.sequences(isolated())
		.build()
		.unwrap();

	let err = factory.build().await.unwrap_err();

	assert!(err.is_circular());
	match err {
		FactoryError::CircularDependency { field, path } => {
			assert_eq!(field, "ping");
			assert_eq!(path, "ping -> pong -> ping");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

/// Test that a self-referencing resolver is reported rather than overflowing
#[rstest]
#[tokio::test]
async fn test_self_reference() {
	let factory = FactoryDefinition::builder("Selfish")
		.field("me", FieldSpec::lazy(|ctx| async move { Ok(ctx.get("me").await?) }))
		.sequences(isolated())
		.build()
		.unwrap();

	assert!(factory.build().await.unwrap_err().is_circular());
}

/// Test that a failing resolver aborts the build with its original error
#[rstest]
#[tokio::test]
async fn test_resolver_error_aborts_build() {
	let factory = FactoryDefinition::builder("Broken")
		.field("ok", 1)
		.field(
			"bad",
			FieldSpec::lazy(|_| async move { Err::<Value, _>(anyhow::anyhow!("upstream down")) }),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	match factory.build().await {
		Err(FactoryError::Resolver { field, source }) => {
			assert_eq!(field, "bad");
			assert_eq!(source.to_string(), "upstream down");
		}
		other => panic!("unexpected result: {other:?}"),
	}
}

/// Test that a transient failure aborts the build even when its reader catches it
#[rstest]
#[tokio::test]
async fn test_caught_transient_failure_aborts_build() {
	let factory = FactoryDefinition::builder("Guarded")
		.transient(
			"secret",
			FieldSpec::lazy(|_| async move { Err::<Value, _>(anyhow::anyhow!("boom")) }),
		)
		.field(
			"v",
			FieldSpec::lazy(|ctx| async move {
				Ok(ctx.get("secret").await.unwrap_or(Some(json!("fallback"))))
			}),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	match factory.build().await {
		Err(FactoryError::Resolver { field, source }) => {
			assert_eq!(field, "secret");
			assert_eq!(source.to_string(), "boom");
		}
		other => panic!("unexpected result: {other:?}"),
	}
}

/// Test that two concurrent reads of one field share a single resolver run
#[rstest]
#[tokio::test]
async fn test_concurrent_gets_share_one_evaluation() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);

	let factory = FactoryDefinition::builder("Fanout")
		.field(
			"both",
			FieldSpec::lazy(|ctx| async move {
				let (left, right) = futures::join!(ctx.get("base"), ctx.get("base"));
				let (left, right): (Option<Value>, Option<Value>) = (left?, right?);
				Ok(json!({"left": left, "right": right}))
			}),
		)
		.field(
			"base",
			FieldSpec::lazy(move |_| {
				let counter = Arc::clone(&counter);
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
					tokio::task::yield_now().await;
					Ok(1)
				}
			}),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	let record = factory.build().await.unwrap();

	assert_eq!(
		record.into_json(),
		json!({"both": {"left": 1, "right": 1}, "base": 1})
	);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Test that `get` on an undeclared field is a configuration error
#[rstest]
#[tokio::test]
async fn test_get_undeclared_field() {
	let factory = FactoryDefinition::builder("User")
		.field("name", FieldSpec::lazy(|ctx| async move { Ok(ctx.get("nmae").await?) }))
		.sequences(isolated())
		.build()
		.unwrap();

	assert!(factory.build().await.unwrap_err().is_configuration());
}

/// Test that resolvers may suspend between reads
#[rstest]
#[tokio::test]
async fn test_async_resolvers_suspend() {
	let factory = FactoryDefinition::builder("Slow")
		.field(
			"first",
			FieldSpec::lazy(|_| async move {
				tokio::task::yield_now().await;
				Ok(1)
			}),
		)
		.field(
			"second",
			FieldSpec::lazy(|ctx| async move {
				let first: Option<i64> = ctx.get_as("first").await?;
				tokio::task::yield_now().await;
				Ok(first.unwrap_or_default() + 1)
			}),
		)
		.sequences(isolated())
		.build()
		.unwrap();

	let record = factory.build().await.unwrap();
	assert_eq!(record.into_json(), json!({"first": 1, "second": 2}));
}

/// Test that nested object literals are returned as opaque values
#[rstest]
#[tokio::test]
async fn test_nested_literal_is_opaque() {
	let factory = FactoryDefinition::builder("Post")
		.field("author", json!({"name": "Komata", "tags": ["a"]}))
		.sequences(isolated())
		.build()
		.unwrap();

	let mut post = factory.build().await.unwrap();
	if let Some(author) = post.get_mut("author") {
		author["name"] = json!("Mikami");
	}

	assert_eq!(post.get("author"), Some(&json!({"name": "Mikami", "tags": ["a"]})));
	let fresh = factory.build().await.unwrap();
	assert_eq!(fresh.get("author"), Some(&json!({"name": "Komata", "tags": ["a"]})));
}
