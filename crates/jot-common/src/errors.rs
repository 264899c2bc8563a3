//! Structured compile errors.
//!
//! Each pipeline phase has its own error type; `CompileError` unifies them
//! and carries the entry package being processed when the failure occurred.

use std::error::Error;
use std::fmt;

/// Parsing / type-checking failure reported by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub path: String,
    pub message: String,
}

impl LoadError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load {}: {}", self.path, self.message)
    }
}

impl Error for LoadError {}

/// Index construction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Two definitions collided on ID (a loader invariant violation).
    DuplicateId { id: String },
    /// A requested entry package has no `main` function.
    MissingMain { path: String },
    /// A program-level invariant does not hold (dangling dependency,
    /// import alias to a non-package, method receiver that is not a type).
    Invariant { id: String, message: String },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "duplicate definition id {id:?}"),
            Self::MissingMain { path } => {
                write!(f, "entry package {path:?} has no main function")
            }
            Self::Invariant { id, message } => {
                write!(f, "invariant violation at {id:?}: {message}")
            }
        }
    }
}

impl Error for IndexError {}

/// A dependency cycle crossing package boundaries.
///
/// Cycles confined to a single package are tolerated (ordered by ID within
/// the strongly-connected component); only cross-package cycles are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// IDs of the definitions forming the offending component, sorted.
    pub ids: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dependency cycle crosses package boundaries: {}",
            self.ids.join(" -> ")
        )
    }
}

impl Error for CycleError {}

/// A dependency edge points at a definition absent from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedError {
    /// The definition whose dependency could not be resolved.
    pub from: String,
    /// The missing dependency ID.
    pub missing: String,
}

impl fmt::Display for UnresolvedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: unresolved dependency {:?}", self.from, self.missing)
    }
}

impl Error for UnresolvedError {}

/// Translation failure for a single definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// A construct the translator does not handle.
    Unsupported { id: String, construct: String },
    /// An identifier that did not resolve to a local, a definition, or a
    /// builtin.
    UnresolvedIdent { id: String, name: String },
    /// A malformed `jsrewrite` template or an out-of-range placeholder.
    BadTemplate { id: String, message: String },
    /// The translator produced no output for a definition that is not
    /// omitted. Compiler-internal invariant violation.
    EmptyOutput { id: String },
}

impl TranslationError {
    /// The ID of the definition being translated when the error occurred.
    pub fn def_id(&self) -> &str {
        match self {
            Self::Unsupported { id, .. }
            | Self::UnresolvedIdent { id, .. }
            | Self::BadTemplate { id, .. }
            | Self::EmptyOutput { id } => id,
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { id, construct } => {
                write!(f, "{id}: unsupported construct {construct}")
            }
            Self::UnresolvedIdent { id, name } => {
                write!(f, "{id}: unresolved identifier {name:?}")
            }
            Self::BadTemplate { id, message } => {
                write!(f, "{id}: bad rewrite template: {message}")
            }
            Self::EmptyOutput { id } => {
                write!(f, "{id}: translation produced no output")
            }
        }
    }
}

impl Error for TranslationError {}

/// Emission-stage failure. Exceptional; indicates an internal bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleError {
    pub message: String,
}

impl BundleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle: {}", self.message)
    }
}

impl Error for BundleError {}

/// Any failure surfaced by `Compiler::compile`, annotated with the entry
/// package being processed where one was in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Entry package path, when the failure occurred inside a per-entry
    /// phase. Index construction failures have no entry.
    pub entry: Option<String>,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    Load(LoadError),
    Index(IndexError),
    Cycle(CycleError),
    Unresolved(UnresolvedError),
    Translation(TranslationError),
    Bundle(BundleError),
}

impl CompileError {
    pub fn new(kind: CompileErrorKind) -> Self {
        Self { entry: None, kind }
    }

    /// Attach the entry package that was being compiled.
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(entry) = &self.entry {
            write!(f, "compiling {entry}: ")?;
        }
        match &self.kind {
            CompileErrorKind::Load(e) => e.fmt(f),
            CompileErrorKind::Index(e) => e.fmt(f),
            CompileErrorKind::Cycle(e) => e.fmt(f),
            CompileErrorKind::Unresolved(e) => e.fmt(f),
            CompileErrorKind::Translation(e) => e.fmt(f),
            CompileErrorKind::Bundle(e) => e.fmt(f),
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            CompileErrorKind::Load(e) => Some(e),
            CompileErrorKind::Index(e) => Some(e),
            CompileErrorKind::Cycle(e) => Some(e),
            CompileErrorKind::Unresolved(e) => Some(e),
            CompileErrorKind::Translation(e) => Some(e),
            CompileErrorKind::Bundle(e) => Some(e),
        }
    }
}

impl From<LoadError> for CompileError {
    fn from(e: LoadError) -> Self {
        Self::new(CompileErrorKind::Load(e))
    }
}

impl From<IndexError> for CompileError {
    fn from(e: IndexError) -> Self {
        Self::new(CompileErrorKind::Index(e))
    }
}

impl From<CycleError> for CompileError {
    fn from(e: CycleError) -> Self {
        Self::new(CompileErrorKind::Cycle(e))
    }
}

impl From<UnresolvedError> for CompileError {
    fn from(e: UnresolvedError) -> Self {
        Self::new(CompileErrorKind::Unresolved(e))
    }
}

impl From<TranslationError> for CompileError {
    fn from(e: TranslationError) -> Self {
        Self::new(CompileErrorKind::Translation(e))
    }
}

impl From<BundleError> for CompileError {
    fn from(e: BundleError) -> Self {
        Self::new(CompileErrorKind::Bundle(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_carries_entry_context() {
        let err = CompileError::from(UnresolvedError {
            from: "app.main".into(),
            missing: "util.Hash".into(),
        })
        .with_entry("app");
        assert_eq!(
            err.to_string(),
            "compiling app: app.main: unresolved dependency \"util.Hash\""
        );
    }

    #[test]
    fn cycle_error_lists_component_ids() {
        let err = CycleError {
            ids: vec!["a.F".into(), "b.G".into()],
        };
        assert!(err.to_string().contains("a.F -> b.G"));
    }

    #[test]
    fn translation_error_exposes_def_id() {
        let err = TranslationError::BadTemplate {
            id: "dom.CreateElement".into(),
            message: "placeholder $3 out of range".into(),
        };
        assert_eq!(err.def_id(), "dom.CreateElement");
    }
}
