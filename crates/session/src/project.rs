//! Submission projects and the chaining contract.
//!
//! Every script submission becomes its own project. A chained submission
//! references exactly one predecessor project, set once at creation, so the
//! chain is singly linked and strictly append-only: declarations from an
//! earlier submission stay visible to later ones through the one-way project
//! reference, while each submission remains independently analyzable.
//!
//! Project construction is a pluggable strategy ([`ProjectBuilder`]) supplied
//! at registry construction; [`default_project_builder`] implements the stock
//! contract.

use std::path::PathBuf;
use std::sync::Arc;

use replpad_primitives::{DocumentId, ProjectId};

use crate::source::SourceContainer;

/// Fixed fallback name for projects created without an explicit one.
pub const DEFAULT_PROJECT_NAME: &str = "New";

/// Name of the synthetic document carrying compilation-level import
/// directives, appended to non-script projects.
pub const GENERATED_USINGS_NAME: &str = "GeneratedUsings";

/// What kind of compilation unit a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
	/// A REPL submission; may chain onto a predecessor.
	Script,
	/// A free-standing compilation unit.
	Regular,
}

/// Arguments for opening a document.
///
/// A working directory and a source container are mandatory; everything else
/// has defaults.
#[derive(Debug, Clone)]
pub struct DocumentCreationArgs {
	/// Compilation-unit name; defaults to [`DEFAULT_PROJECT_NAME`].
	pub name: Option<String>,
	/// Directory source-relative references resolve against.
	pub working_directory: Option<PathBuf>,
	/// The live text container backing the document.
	pub source: Option<Arc<SourceContainer>>,
	/// Submission kind.
	pub kind: SourceKind,
}

impl DocumentCreationArgs {
	/// Start a fresh argument set for the given kind.
	pub fn new(kind: SourceKind) -> Self {
		Self { name: None, working_directory: None, source: None, kind }
	}

	/// Set the compilation-unit name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Set the working directory.
	pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
		self.working_directory = Some(dir.into());
		self
	}

	/// Set the source container.
	pub fn source(mut self, source: Arc<SourceContainer>) -> Self {
		self.source = Some(source);
		self
	}
}

/// Compilation-level options handed to the project builder.
#[derive(Debug, Clone, Default)]
pub struct CompilationOptions {
	/// Import directives visible without the user retyping them.
	pub default_imports: Vec<String>,
	/// Script submissions compile into a class of this name.
	pub script_class_name: Option<String>,
}

/// One project in a workspace solution.
#[derive(Debug, Clone)]
pub struct ProjectState {
	/// Identity of this compilation unit.
	pub id: ProjectId,
	/// Display and script-class name.
	pub name: String,
	/// Submission kind.
	pub kind: SourceKind,
	/// The immediately prior submission, set exactly once at creation.
	pub predecessor: Option<ProjectId>,
	/// External library references. Empty for chained projects: everything
	/// is already visible transitively through the chain.
	pub metadata_references: Vec<String>,
	/// Compilation-level options.
	pub options: CompilationOptions,
	/// Documents belonging to this project, in append order.
	pub documents: Vec<DocumentId>,
}

/// Output of a [`ProjectBuilder`] invocation.
#[derive(Debug, Clone)]
pub struct BuiltProject {
	/// The new project, with no documents attached yet.
	pub project: ProjectState,
	/// Text of the synthetic generated-usings document to append, if any.
	pub generated_usings: Option<String>,
}

/// Strategy that builds a project from a predecessor, creation arguments and
/// compilation options. Supplied at [`SessionRegistry`] construction.
///
/// [`SessionRegistry`]: crate::registry::SessionRegistry
pub type ProjectBuilder =
	Arc<dyn Fn(Option<&ProjectState>, &DocumentCreationArgs, CompilationOptions) -> BuiltProject + Send + Sync>;

/// The stock project-build contract.
///
/// - A chained project depends on its predecessor via a one-way reference
///   and carries zero metadata references of its own; a first project gets
///   the full `default_references` set.
/// - The name falls back to [`DEFAULT_PROJECT_NAME`].
/// - Script projects compile into a script class named after the project.
/// - Non-script projects with imports get a generated-usings document
///   assembled from the distinct compilation-level import directives.
pub fn default_project_builder(default_references: Vec<String>) -> ProjectBuilder {
	Arc::new(move |previous, args, mut options| {
		let name = args.name.clone().unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
		let is_script = args.kind == SourceKind::Script;

		if is_script {
			options.script_class_name = Some(name.clone());
		}

		let metadata_references = if previous.is_some() { Vec::new() } else { default_references.clone() };

		let project = ProjectState {
			id: ProjectId::fresh(),
			name,
			kind: args.kind,
			predecessor: previous.map(|p| p.id),
			metadata_references,
			options,
			documents: Vec::new(),
		};

		let generated_usings = (!is_script)
			.then(|| assemble_usings(&project.options.default_imports))
			.filter(|text| !text.is_empty());

		BuiltProject { project, generated_usings }
	})
}

/// Join the distinct import directives into one synthetic document's text.
pub fn assemble_usings(imports: &[String]) -> String {
	let mut seen = Vec::new();
	let mut directives = Vec::new();
	for import in imports {
		if seen.contains(&import) {
			continue;
		}
		seen.push(import);
		directives.push(format!("global using {import};"));
	}
	directives.join(" ")
}
