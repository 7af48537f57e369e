//! Workspaces and their copy-on-write solution snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use replpad_primitives::{DiagnosticsChanged, DocumentId, ProjectId};
use tokio::sync::broadcast;

use crate::engine::DiagnosticsSink;
use crate::project::ProjectState;
use crate::source::SourceContainer;

/// Capacity of a workspace's diagnostics broadcast channel. A slow consumer
/// past this depth observes a lag error instead of blocking re-analysis.
const DIAGNOSTICS_CHANNEL_CAPACITY: usize = 256;

/// Per-document state inside a solution.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
	/// The project the document belongs to.
	pub project: ProjectId,
	/// Display name.
	pub name: String,
	/// The live text container.
	pub source: Arc<SourceContainer>,
	/// Synthetic documents (generated usings) exist only so analysis sees
	/// them: excluded from persistence and not independently closable.
	pub synthetic: bool,
}

/// One immutable snapshot of everything a workspace knows.
///
/// Snapshots are replaced wholesale, never mutated in place, so a reader
/// holding an `Arc<Solution>` can never observe a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct Solution {
	documents: HashMap<DocumentId, DocumentEntry>,
	projects: HashMap<ProjectId, ProjectState>,
}

impl Solution {
	/// Look up a document entry.
	pub fn document(&self, id: DocumentId) -> Option<&DocumentEntry> {
		self.documents.get(&id)
	}

	/// Look up a project.
	pub fn project(&self, id: ProjectId) -> Option<&ProjectState> {
		self.projects.get(&id)
	}

	/// All documents, in no particular order.
	pub fn documents(&self) -> impl Iterator<Item = (DocumentId, &DocumentEntry)> {
		self.documents.iter().map(|(id, entry)| (*id, entry))
	}

	/// Number of non-synthetic documents.
	pub fn open_document_count(&self) -> usize {
		self.documents.values().filter(|entry| !entry.synthetic).count()
	}

	pub(crate) fn insert_project(&mut self, project: ProjectState) {
		self.projects.insert(project.id, project);
	}

	pub(crate) fn insert_document(&mut self, id: DocumentId, entry: DocumentEntry) {
		if let Some(project) = self.projects.get_mut(&entry.project) {
			project.documents.push(id);
		}
		self.documents.insert(id, entry);
	}

	pub(crate) fn remove_document(&mut self, id: DocumentId) -> Option<DocumentEntry> {
		let entry = self.documents.remove(&id)?;
		if let Some(project) = self.projects.get_mut(&entry.project) {
			project.documents.retain(|doc| *doc != id);
		}
		Some(entry)
	}

	/// Walk predecessor links from `project` to the chain's origin.
	///
	/// The returned chain starts at `project` itself. Predecessor pointers
	/// are set exactly once at creation from an already-existing project, so
	/// the walk always terminates.
	pub fn project_chain(&self, project: ProjectId) -> Vec<ProjectId> {
		let mut chain = Vec::new();
		let mut current = Some(project);
		while let Some(id) = current {
			let Some(state) = self.projects.get(&id) else { break };
			chain.push(id);
			current = state.predecessor;
		}
		chain
	}
}

/// Owning container for one evolving analysis snapshot, shared by one or
/// more chained documents.
///
/// Owned exclusively by the registry; disposed as soon as its last
/// non-synthetic document closes.
#[derive(Debug)]
pub struct Workspace {
	solution: ArcSwap<Solution>,
	diagnostics: broadcast::Sender<DiagnosticsChanged>,
}

impl Default for Workspace {
	fn default() -> Self {
		Self::new()
	}
}

impl Workspace {
	/// Create an empty workspace with its own diagnostics channel.
	pub fn new() -> Self {
		let (diagnostics, _) = broadcast::channel(DIAGNOSTICS_CHANNEL_CAPACITY);
		Self { solution: ArcSwap::from_pointee(Solution::default()), diagnostics }
	}

	/// The current solution snapshot.
	pub fn snapshot(&self) -> Arc<Solution> {
		self.solution.load_full()
	}

	/// Replace the solution wholesale.
	pub(crate) fn set_solution(&self, solution: Solution) {
		self.solution.store(Arc::new(solution));
	}

	/// Derive a new solution from the current one and publish it.
	///
	/// `update` may run more than once under contention; it must be a pure
	/// function of its input.
	pub(crate) fn update_solution<F>(&self, mut update: F)
	where
		F: FnMut(&Solution) -> Solution,
	{
		self.solution.rcu(|current| update(current));
	}

	/// Subscribe to this workspace's diagnostic-change feed.
	pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<DiagnosticsChanged> {
		self.diagnostics.subscribe()
	}

	/// The sender handed to the engine when documents are registered.
	pub fn diagnostics_sink(&self) -> DiagnosticsSink {
		self.diagnostics.clone()
	}
}
