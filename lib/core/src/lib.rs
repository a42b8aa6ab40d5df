//! Core domain types for zed-typegen.
//!
//! This crate holds the compiled schema object model shared by the schema
//! compiler and the definition generator, together with the
//! [`SchemaCompiler`] seam that connects them.

pub mod compiler;
pub mod diagnostic;
pub mod model;

pub use compiler::SchemaCompiler;
pub use diagnostic::{SchemaDiagnostic, SourcePosition};
pub use model::{
    CaveatDefinition, CompiledSchema, ObjectDefinition, RelationDefinition, RelationKind,
};
