//! The jot compilation pipeline.
//!
//! `Compiler::compile` runs the five phases per entry: load (through the
//! caller's `Loader`), index, schedule, group, translate + bundle. Phases
//! hand off immutable data; a failure in any phase aborts the whole call
//! with a structured error carrying the entry being processed.

pub mod bundle;
pub mod graph;
pub mod group;

use jot_common::CompileError;
use jot_ir::{Index, Loader, Program};
use jot_translator::Translator;

pub use graph::{DepGraph, prune};
pub use group::{Module, group};

/// The final output for one entry: the entry package path and the complete
/// self-contained JS program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: String,
    pub source: String,
}

pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile the given entry package paths, one script per entry, in
    /// input order.
    pub fn compile<L: Loader>(
        &self,
        loader: &L,
        paths: &[&str],
    ) -> Result<Vec<Script>, CompileError> {
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        let program = loader.load(&paths)?;
        self.compile_program(&program)
    }

    /// Compile an already-loaded program.
    #[tracing::instrument(level = "debug", skip_all, fields(entries = program.entries.len()))]
    pub fn compile_program(&self, program: &Program) -> Result<Vec<Script>, CompileError> {
        let index = Index::new(program)?;
        let graph = DepGraph::discover(&index)?;
        let translator = Translator::new(&index);

        let mut scripts = Vec::with_capacity(index.mains().len());
        for main in index.mains() {
            let entry = main.path().to_string();
            tracing::debug!(%entry, "compiling entry");

            let sorted = graph
                .sort(&index, main)
                .map_err(|e| CompileError::from(e).with_entry(&entry))?;
            for def in &sorted {
                tracing::trace!(id = %def.id(), "sorted");
            }

            let pruned = prune(&index, sorted)
                .map_err(|e| CompileError::from(e).with_entry(&entry))?;
            let modules = group(&pruned, &entry);

            let program_js = bundle::bundle(&translator, &modules, &entry)
                .map_err(|e| e.with_entry(&entry))?;
            scripts.push(Script {
                path: entry,
                source: program_js.to_source(),
            });
        }

        Ok(scripts)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
