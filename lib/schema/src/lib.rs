//! SpiceDB schema DSL compiler.
//!
//! Parses schema text into a syntax tree, checks that every reference in it
//! resolves, and lowers the result into the
//! [`CompiledSchema`](zed_typegen_core::CompiledSchema) object model.
//!
//! ```text
//! definition user {}
//!
//! definition document {
//!     relation writer: user
//!     relation reader: user
//!
//!     permission edit = writer
//!     permission view = reader + edit
//! }
//! ```

mod ast;
mod checker;
mod compiler;
mod parser;

pub use compiler::DslCompiler;
