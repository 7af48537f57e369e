//! The session registry: document lifecycle and workspace ownership.
//!
//! The registry owns every [`Workspace`]. Workspaces live in an arena of
//! slots; the document index maps identities to slot indices, not owning
//! references, and a slot is freed the moment its open-document count
//! reaches zero. There are no idle workspaces.
//!
//! # Concurrency
//!
//! All indices live under one consolidated `RwLock` so open/close/lookup
//! observe a consistent view. Insert and remove are independent atomic
//! operations; no compound transaction ever spans two documents. Engine
//! calls happen outside the lock.

use std::sync::{Arc, Once};

use parking_lot::RwLock;
use replpad_primitives::{DiagnosticsChanged, DocumentId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::engine::AnalysisEngine;
use crate::project::{
	CompilationOptions, DocumentCreationArgs, GENERATED_USINGS_NAME, ProjectBuilder, ProjectState,
	default_project_builder,
};
use crate::source::SourceContainer;
use crate::workspace::{DocumentEntry, Workspace};
use crate::{Error, Result};

/// Stable index of a workspace slot in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceIndex(u32);

/// Defaults applied to every first (unchained) project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
	/// Metadata references a first project receives.
	#[serde(default)]
	pub default_references: Vec<String>,
	/// Import directives visible to every project without retyping.
	#[serde(default)]
	pub default_imports: Vec<String>,
}

struct WorkspaceSlot {
	workspace: Arc<Workspace>,
	/// Non-synthetic documents currently open in this workspace.
	open_documents: usize,
}

/// Arena plus document index, consolidated so lifecycle transitions update
/// both atomically.
#[derive(Default)]
struct RegistryState {
	slots: Vec<Option<WorkspaceSlot>>,
	free: Vec<u32>,
	doc_index: std::collections::HashMap<DocumentId, WorkspaceIndex>,
}

impl RegistryState {
	fn alloc_slot(&mut self, slot: WorkspaceSlot) -> WorkspaceIndex {
		match self.free.pop() {
			Some(index) => {
				self.slots[index as usize] = Some(slot);
				WorkspaceIndex(index)
			}
			None => {
				self.slots.push(Some(slot));
				WorkspaceIndex(self.slots.len() as u32 - 1)
			}
		}
	}

	fn slot(&self, index: WorkspaceIndex) -> Option<&WorkspaceSlot> {
		self.slots.get(index.0 as usize)?.as_ref()
	}

	fn slot_mut(&mut self, index: WorkspaceIndex) -> Option<&mut WorkspaceSlot> {
		self.slots.get_mut(index.0 as usize)?.as_mut()
	}

	fn free_slot(&mut self, index: WorkspaceIndex) -> Option<WorkspaceSlot> {
		let slot = self.slots.get_mut(index.0 as usize)?.take();
		if slot.is_some() {
			self.free.push(index.0);
		}
		slot
	}

	fn occupied(&self) -> usize {
		self.slots.iter().filter(|slot| slot.is_some()).count()
	}
}

/// Owns the mapping from open documents to their workspaces.
pub struct SessionRegistry {
	state: RwLock<RegistryState>,
	engine: Arc<dyn AnalysisEngine>,
	builder: ProjectBuilder,
	config: SessionConfig,
	warmed: Once,
}

impl SessionRegistry {
	/// Create a registry using the stock project-build contract.
	pub fn new(engine: Arc<dyn AnalysisEngine>, config: SessionConfig) -> Self {
		let builder = default_project_builder(config.default_references.clone());
		Self::with_project_builder(engine, config, builder)
	}

	/// Create a registry with a custom project-build strategy.
	pub fn with_project_builder(
		engine: Arc<dyn AnalysisEngine>,
		config: SessionConfig,
		builder: ProjectBuilder,
	) -> Self {
		let registry = Self {
			state: RwLock::new(RegistryState::default()),
			engine,
			builder,
			config,
			warmed: Once::new(),
		};
		registry.warm_up();
		registry
	}

	/// Prime the engine exactly once per registry instance.
	fn warm_up(&self) {
		self.warmed.call_once(|| self.engine.warm_up());
	}

	/// Open a document in a fresh workspace.
	///
	/// Builds the workspace's first project (no predecessor, full default
	/// reference set), registers the document with the engine and wires the
	/// workspace's diagnostics channel to it.
	///
	/// # Errors
	///
	/// [`Error::InvalidArgument`] when `args` lack a working directory or a
	/// source container; engine registration failures propagate.
	pub async fn open_document(&self, args: DocumentCreationArgs) -> Result<DocumentId> {
		validate(&args)?;

		let workspace = Arc::new(Workspace::new());
		let document = self.add_document(&workspace, None, args).await?.document;

		let index = {
			let mut state = self.state.write();
			let index = state.alloc_slot(WorkspaceSlot { workspace, open_documents: 1 });
			state.doc_index.insert(document, index);
			index
		};

		info!(%document, workspace = index.0, "opened document");
		Ok(document)
	}

	/// Open a document in the workspace that owns `existing`.
	///
	/// With `chain` set, the new document's project references `existing`'s
	/// project as its predecessor, so earlier declarations stay visible.
	/// Without it the document shares the workspace but starts an
	/// independent chain.
	///
	/// # Errors
	///
	/// [`Error::UnknownDocument`] when no live workspace owns `existing`;
	/// [`Error::InvalidArgument`] on malformed args; engine registration
	/// failures propagate.
	pub async fn open_related_document(
		&self,
		existing: DocumentId,
		args: DocumentCreationArgs,
		chain: bool,
	) -> Result<DocumentId> {
		validate(&args)?;

		let (index, workspace) = {
			let state = self.state.read();
			let index = *state.doc_index.get(&existing).ok_or(Error::UnknownDocument(existing))?;
			let slot = state.slot(index).ok_or(Error::UnknownDocument(existing))?;
			(index, slot.workspace.clone())
		};

		let previous = if chain {
			let snapshot = workspace.snapshot();
			let entry = snapshot.document(existing).ok_or(Error::UnknownDocument(existing))?;
			Some(snapshot.project(entry.project).ok_or(Error::UnknownDocument(existing))?.clone())
		} else {
			None
		};

		let added = self.add_document(&workspace, previous, args).await?;
		let document = added.document;

		let raced = {
			let mut state = self.state.write();
			match state.slot_mut(index) {
				// The workspace is still live; adopt the new document.
				Some(slot) if Arc::ptr_eq(&slot.workspace, &workspace) => {
					slot.open_documents += 1;
					state.doc_index.insert(document, index);
					false
				}
				// The last sibling closed while we were registering.
				_ => true,
			}
		};

		if raced {
			// The workspace died mid-open; nothing we registered survives.
			for id in added.engine_documents {
				self.engine.remove_document(id).await;
			}
			return Err(Error::UnknownDocument(existing));
		}

		info!(%document, related = %existing, chain, workspace = index.0, "opened related document");
		Ok(document)
	}

	/// Close a document. A no-op for unknown identities.
	///
	/// Removes the document from its workspace's snapshot; disposes the
	/// workspace when no open documents remain.
	pub async fn close_document(&self, document: DocumentId) {
		let disposed = {
			let mut state = self.state.write();
			let Some(index) = state.doc_index.remove(&document) else {
				debug!(%document, "close of unknown document ignored");
				return;
			};
			let Some(slot) = state.slot_mut(index) else {
				return;
			};

			slot.workspace.update_solution(|current| {
				let mut solution = current.clone();
				solution.remove_document(document);
				solution
			});

			slot.open_documents = slot.open_documents.saturating_sub(1);
			if slot.open_documents == 0 {
				state.free_slot(index).map(|slot| (index, slot.workspace))
			} else {
				None
			}
		};

		self.engine.remove_document(document).await;

		if let Some((index, workspace)) = disposed {
			// Synthetic documents die with their workspace.
			for (id, _) in workspace.snapshot().documents() {
				self.engine.remove_document(id).await;
			}
			info!(workspace = index.0, "disposed workspace");
		} else {
			info!(%document, "closed document");
		}
	}

	/// The document's current state, or `None` for unknown identities.
	/// Never fails.
	pub fn get_document_state(&self, document: DocumentId) -> Option<DocumentEntry> {
		let workspace = self.workspace_for(document)?;
		workspace.snapshot().document(document).cloned()
	}

	/// The workspace owning `document`, if any.
	pub fn workspace_for(&self, document: DocumentId) -> Option<Arc<Workspace>> {
		let state = self.state.read();
		let index = *state.doc_index.get(&document)?;
		Some(state.slot(index)?.workspace.clone())
	}

	/// The arena index of the workspace owning `document`.
	pub fn workspace_of(&self, document: DocumentId) -> Option<WorkspaceIndex> {
		self.state.read().doc_index.get(&document).copied()
	}

	/// The project owning `document`.
	pub fn project_of(&self, document: DocumentId) -> Option<ProjectState> {
		let workspace = self.workspace_for(document)?;
		let snapshot = workspace.snapshot();
		let entry = snapshot.document(document)?;
		snapshot.project(entry.project).cloned()
	}

	/// Predecessor chain of `document`'s project, starting at the project
	/// itself.
	pub fn project_chain(&self, document: DocumentId) -> Vec<replpad_primitives::ProjectId> {
		let Some(workspace) = self.workspace_for(document) else { return Vec::new() };
		let snapshot = workspace.snapshot();
		let Some(entry) = snapshot.document(document) else { return Vec::new() };
		snapshot.project_chain(entry.project)
	}

	/// Subscribe to the diagnostics feed of the workspace owning `document`.
	///
	/// # Errors
	///
	/// [`Error::UnknownDocument`] when no live workspace owns `document`.
	pub fn subscribe_diagnostics(&self, document: DocumentId) -> Result<broadcast::Receiver<DiagnosticsChanged>> {
		self.workspace_for(document)
			.map(|workspace| workspace.subscribe_diagnostics())
			.ok_or(Error::UnknownDocument(document))
	}

	/// Number of live workspaces.
	pub fn workspace_count(&self) -> usize {
		self.state.read().occupied()
	}

	/// The analysis engine this registry orchestrates.
	pub fn engine(&self) -> Arc<dyn AnalysisEngine> {
		self.engine.clone()
	}

	/// Build a project, attach the document (plus any generated-usings
	/// sibling) to the workspace solution, and register everything with the
	/// engine. Caller is responsible for index bookkeeping.
	async fn add_document(
		&self,
		workspace: &Arc<Workspace>,
		previous: Option<ProjectState>,
		args: DocumentCreationArgs,
	) -> Result<AddedDocument> {
		// validate() ran before this point.
		let source = args.source.clone().ok_or_else(|| Error::InvalidArgument("missing source container".into()))?;

		let options = CompilationOptions {
			// Chain roots get the defaults; chained projects already see
			// them transitively through the predecessor.
			default_imports: if previous.is_some() { Vec::new() } else { self.config.default_imports.clone() },
			script_class_name: None,
		};
		let built = (self.builder)(previous.as_ref(), &args, options);
		let project = built.project;

		let document = DocumentId::fresh();
		let document_name = args.name.clone().unwrap_or_else(|| project.name.clone());
		let project_id = project.id;

		let usings = built.generated_usings.map(|text| (DocumentId::fresh(), Arc::new(SourceContainer::new(text))));

		self.engine
			.register_document(document, &project, source.clone(), workspace.diagnostics_sink())
			.await?;
		let mut engine_documents = vec![document];
		if let Some((usings_id, usings_source)) = &usings {
			let registered = self
				.engine
				.register_document(*usings_id, &project, usings_source.clone(), workspace.diagnostics_sink())
				.await;
			if let Err(err) = registered {
				// Roll back the half-registered pair.
				self.engine.remove_document(document).await;
				return Err(err.into());
			}
			engine_documents.push(*usings_id);
		}

		workspace.update_solution(|current| {
			let mut solution = current.clone();
			solution.insert_project(project.clone());
			solution.insert_document(
				document,
				DocumentEntry {
					project: project_id,
					name: document_name.clone(),
					source: source.clone(),
					synthetic: false,
				},
			);
			if let Some((usings_id, usings_source)) = &usings {
				// Appended after the main document, excluded from persistence.
				solution.insert_document(
					*usings_id,
					DocumentEntry {
						project: project_id,
						name: GENERATED_USINGS_NAME.to_string(),
						source: usings_source.clone(),
						synthetic: true,
					},
				);
			}
			solution
		});
		Ok(AddedDocument { document, engine_documents })
	}
}

/// Result of one [`SessionRegistry::add_document`] call: the new document
/// plus every engine registration the call performed, so a failed or raced
/// open can roll all of them back.
struct AddedDocument {
	document: DocumentId,
	engine_documents: Vec<DocumentId>,
}

impl std::fmt::Debug for SessionRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct("SessionRegistry")
			.field("workspaces", &state.occupied())
			.field("documents", &state.doc_index.len())
			.finish()
	}
}

fn validate(args: &DocumentCreationArgs) -> Result<()> {
	if args.working_directory.is_none() {
		return Err(Error::InvalidArgument("missing working directory".into()));
	}
	if args.source.is_none() {
		return Err(Error::InvalidArgument("missing source container".into()));
	}
	Ok(())
}

#[cfg(test)]
mod tests;
