//! TypeScript definition generation for SpiceDB schemas.
//!
//! Turns a schema file into a TypeScript module for `@authzed/authzed-node`
//! that maps every resource type to the permissions checkable on it, plus a
//! `PermissionRequest` builder that only accepts those pairings.
//!
//! The pipeline is [`load_schema`] → [`SchemaCompiler`](zed_typegen_core::SchemaCompiler)
//! → [`synthesize_definitions`], wrapped up by [`generate_definition`].

mod error;
mod generate;
mod source;
mod synth;
mod template;

pub use error::{GenerateError, SourceError};
pub use generate::generate_definition;
pub use source::{DirSource, MemorySource, SchemaSource, load_schema};
pub use synth::{ResourceEntry, ResourcePermissionMap, synthesize_definitions};
pub use template::CLIENT_LIBRARY;
