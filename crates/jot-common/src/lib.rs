//! Common types for the jot compiler.
//!
//! This crate provides the structured error taxonomy shared by all jot
//! crates. Every pipeline phase surfaces one of these error types; nothing
//! is recovered locally and partial output is never produced.

pub mod errors;

pub use errors::{
    BundleError, CompileError, CycleError, IndexError, LoadError, TranslationError,
    UnresolvedError,
};
