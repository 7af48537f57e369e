use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::*;
use crate::Error;
use crate::mock::MockEngine;
use crate::project::{DEFAULT_PROJECT_NAME, SourceKind};

fn args(kind: SourceKind) -> DocumentCreationArgs {
	DocumentCreationArgs::new(kind)
		.working_directory("/tmp/session")
		.source(Arc::new(SourceContainer::new("")))
}

fn registry_with(engine: Arc<MockEngine>, config: SessionConfig) -> SessionRegistry {
	SessionRegistry::new(engine, config)
}

fn registry(engine: Arc<MockEngine>) -> SessionRegistry {
	registry_with(
		engine,
		SessionConfig { default_references: vec!["corelib".into(), "linq".into()], default_imports: Vec::new() },
	)
}

#[tokio::test]
async fn missing_working_directory_is_rejected() {
	let registry = registry(Arc::new(MockEngine::new()));
	let args = DocumentCreationArgs::new(SourceKind::Script).source(Arc::new(SourceContainer::new("")));
	assert!(matches!(registry.open_document(args).await, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn missing_source_container_is_rejected() {
	let registry = registry(Arc::new(MockEngine::new()));
	let args = DocumentCreationArgs::new(SourceKind::Script).working_directory("/tmp/session");
	assert!(matches!(registry.open_document(args).await, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn open_then_close_disposes_the_workspace() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry(engine.clone());

	let document = registry.open_document(args(SourceKind::Script)).await.unwrap();
	assert!(registry.get_document_state(document).is_some());
	assert_eq!(registry.workspace_count(), 1);

	registry.close_document(document).await;
	assert!(registry.get_document_state(document).is_none());
	assert_eq!(registry.workspace_count(), 0);
	assert!(engine.removed.lock().contains(&document));
}

#[tokio::test]
async fn closing_twice_is_a_no_op() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry(engine.clone());

	let document = registry.open_document(args(SourceKind::Script)).await.unwrap();
	registry.close_document(document).await;
	registry.close_document(document).await;

	assert_eq!(registry.workspace_count(), 0);
	assert_eq!(engine.removed.lock().iter().filter(|id| **id == document).count(), 1);
}

#[tokio::test]
async fn relating_to_an_unknown_document_fails() {
	let registry = registry(Arc::new(MockEngine::new()));
	let ghost = DocumentId::fresh();
	let result = registry.open_related_document(ghost, args(SourceKind::Script), true).await;
	assert!(matches!(result, Err(Error::UnknownDocument(id)) if id == ghost));
}

#[tokio::test]
async fn chained_submissions_form_a_predecessor_chain() {
	let registry = registry(Arc::new(MockEngine::new()));

	let first = registry.open_document(args(SourceKind::Script)).await.unwrap();
	let second = registry.open_related_document(first, args(SourceKind::Script), true).await.unwrap();
	let third = registry.open_related_document(second, args(SourceKind::Script), true).await.unwrap();

	let first_project = registry.project_of(first).unwrap();
	let third_project = registry.project_of(third).unwrap();

	// Chained projects lean on the chain instead of their own references.
	assert!(third_project.metadata_references.is_empty());
	assert_eq!(first_project.metadata_references, vec!["corelib", "linq"]);

	let chain = registry.project_chain(third);
	assert_eq!(chain.len(), 3);
	assert_eq!(chain.last(), Some(&first_project.id));

	// All three share one workspace.
	assert_eq!(registry.workspace_count(), 1);
	assert_eq!(registry.workspace_of(first), registry.workspace_of(third));
}

#[tokio::test]
async fn unchained_siblings_share_the_workspace_but_not_the_chain() {
	let registry = registry(Arc::new(MockEngine::new()));

	let first = registry.open_document(args(SourceKind::Script)).await.unwrap();
	let second = registry.open_related_document(first, args(SourceKind::Script), false).await.unwrap();

	let second_project = registry.project_of(second).unwrap();
	assert!(second_project.predecessor.is_none());
	assert_eq!(second_project.metadata_references, vec!["corelib", "linq"]);
	assert_eq!(registry.workspace_of(first), registry.workspace_of(second));
	assert_eq!(registry.project_chain(second).len(), 1);
}

#[tokio::test]
async fn closing_an_earlier_submission_keeps_the_workspace_alive() {
	let registry = registry(Arc::new(MockEngine::new()));

	let first = registry.open_document(args(SourceKind::Script)).await.unwrap();
	let second = registry.open_related_document(first, args(SourceKind::Script), true).await.unwrap();

	registry.close_document(first).await;
	assert_eq!(registry.workspace_count(), 1);
	assert!(registry.get_document_state(second).is_some());

	registry.close_document(second).await;
	assert_eq!(registry.workspace_count(), 0);
}

#[tokio::test]
async fn regular_projects_get_a_generated_usings_sibling() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry_with(
		engine.clone(),
		SessionConfig {
			default_references: Vec::new(),
			default_imports: vec!["System".into(), "System.Linq".into()],
		},
	);

	let document = registry.open_document(args(SourceKind::Regular)).await.unwrap();

	let registrations = engine.registrations.lock();
	assert_eq!(registrations.len(), 2);
	let usings = registrations.iter().find(|reg| reg.document != document).unwrap();
	assert_eq!(usings.source.current_text(), "global using System; global using System.Linq;");

	let workspace = registry.workspace_for(document).unwrap();
	let snapshot = workspace.snapshot();
	let sibling = snapshot.document(usings.document).unwrap();
	assert!(sibling.synthetic);
	assert_eq!(sibling.name, GENERATED_USINGS_NAME);
	// Synthetic documents do not count toward the open total.
	assert_eq!(snapshot.open_document_count(), 1);
}

#[tokio::test]
async fn synthetic_documents_die_with_their_workspace() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry_with(
		engine.clone(),
		SessionConfig { default_references: Vec::new(), default_imports: vec!["System".into()] },
	);

	let document = registry.open_document(args(SourceKind::Regular)).await.unwrap();
	let usings = engine.registered_documents().into_iter().find(|id| *id != document).unwrap();

	registry.close_document(document).await;
	let removed = engine.removed.lock();
	assert!(removed.contains(&document));
	assert!(removed.contains(&usings));
}

#[tokio::test]
async fn script_projects_skip_the_usings_sibling_and_get_a_script_class() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry_with(
		engine.clone(),
		SessionConfig { default_references: Vec::new(), default_imports: vec!["System".into()] },
	);

	let document = registry.open_document(args(SourceKind::Script).name("Submission1")).await.unwrap();

	let registrations = engine.registrations.lock();
	assert_eq!(registrations.len(), 1);
	// The engine sees the script class through the registered project.
	assert_eq!(registrations[0].project.options.script_class_name.as_deref(), Some("Submission1"));
	drop(registrations);

	let project = registry.project_of(document).unwrap();
	assert_eq!(project.options.script_class_name.as_deref(), Some("Submission1"));
}

#[tokio::test]
async fn unnamed_documents_fall_back_to_the_stock_name() {
	let registry = registry(Arc::new(MockEngine::new()));
	let document = registry.open_document(args(SourceKind::Script)).await.unwrap();
	let entry = registry.get_document_state(document).unwrap();
	assert_eq!(entry.name, DEFAULT_PROJECT_NAME);
}

#[tokio::test]
async fn the_engine_is_warmed_exactly_once() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry(engine.clone());
	assert_eq!(engine.warm_ups.load(Ordering::SeqCst), 1);

	registry.open_document(args(SourceKind::Script)).await.unwrap();
	registry.open_document(args(SourceKind::Script)).await.unwrap();
	assert_eq!(engine.warm_ups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn diagnostics_subscription_requires_a_live_document() {
	let registry = registry(Arc::new(MockEngine::new()));
	assert!(registry.subscribe_diagnostics(DocumentId::fresh()).is_err());

	let document = registry.open_document(args(SourceKind::Script)).await.unwrap();
	assert!(registry.subscribe_diagnostics(document).is_ok());
}

#[tokio::test]
async fn engine_registration_failure_leaks_no_workspace() {
	let engine = Arc::new(MockEngine::new().with_register_error("engine offline"));
	let registry = registry(engine);
	let result = registry.open_document(args(SourceKind::Script)).await;
	assert!(matches!(result, Err(Error::Engine(_))));
	assert_eq!(registry.workspace_count(), 0);
}

#[tokio::test]
async fn chained_projects_get_no_default_imports() {
	let engine = Arc::new(MockEngine::new());
	let registry = registry_with(
		engine.clone(),
		SessionConfig { default_references: Vec::new(), default_imports: vec!["System".into()] },
	);

	let first = registry.open_document(args(SourceKind::Regular)).await.unwrap();
	let second = registry.open_related_document(first, args(SourceKind::Regular), true).await.unwrap();

	// The root registered a usings sibling; the chained project must not.
	assert_eq!(engine.registrations.lock().len(), 3);
	let project = registry.project_of(second).unwrap();
	assert!(project.predecessor.is_some());
	assert!(project.options.default_imports.is_empty());
}

#[tokio::test]
async fn a_failed_sibling_registration_rolls_back_the_primary() {
	let engine = Arc::new(MockEngine::new().with_register_limit(1));
	let registry = registry_with(
		engine.clone(),
		SessionConfig { default_references: Vec::new(), default_imports: vec!["System".into()] },
	);

	let result = registry.open_document(args(SourceKind::Regular)).await;
	assert!(matches!(result, Err(Error::Engine(_))));

	let registered = engine.registered_documents();
	assert_eq!(registered.len(), 1);
	assert_eq!(*engine.removed.lock(), registered);
	assert_eq!(registry.workspace_count(), 0);
}

#[tokio::test]
async fn a_close_racing_a_related_open_leaks_no_engine_documents() {
	let engine = Arc::new(MockEngine::new());
	let registry = Arc::new(registry_with(
		engine.clone(),
		SessionConfig { default_references: Vec::new(), default_imports: vec!["System".into()] },
	));

	let first = registry.open_document(args(SourceKind::Script)).await.unwrap();

	// Park the related open's first engine registration, then close the
	// sibling out from under it.
	let gate = Arc::new(tokio::sync::Notify::new());
	engine.gate_next_registration(gate.clone());
	let opening = tokio::spawn({
		let registry = registry.clone();
		async move { registry.open_related_document(first, args(SourceKind::Regular), false).await }
	});
	for _ in 0..16 {
		tokio::task::yield_now().await;
	}
	registry.close_document(first).await;
	gate.notify_one();

	let result = opening.await.unwrap();
	assert!(matches!(result, Err(Error::UnknownDocument(id)) if id == first));

	// The raced primary and its usings sibling were both rolled back.
	let registered = engine.registered_documents();
	assert_eq!(registered.len(), 3);
	let removed = engine.removed.lock();
	assert!(removed.contains(&registered[1]));
	assert!(removed.contains(&registered[2]));
	assert_eq!(registry.workspace_count(), 0);
}

#[tokio::test]
async fn custom_project_builders_are_honored() {
	let builder: ProjectBuilder = {
		let stock = default_project_builder(Vec::new());
		Arc::new(move |previous, args, options| {
			let mut built = stock(previous, args, options);
			built.project.name = format!("custom-{}", built.project.name);
			built
		})
	};
	let registry =
		SessionRegistry::with_project_builder(Arc::new(MockEngine::new()), SessionConfig::default(), builder);

	let document = registry.open_document(args(SourceKind::Script)).await.unwrap();
	assert_eq!(registry.project_of(document).unwrap().name, "custom-New");
}
