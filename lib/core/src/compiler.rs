//! The schema compiler seam.

use crate::diagnostic::SchemaDiagnostic;
use crate::model::CompiledSchema;
use rootcause::prelude::Report;

/// Turns raw schema text into a validated object model.
///
/// Implementations must be reentrant: compiling the same text twice yields
/// equal models and no state is shared between calls.
pub trait SchemaCompiler {
    /// Compiles `schema` or reports why it is invalid.
    fn compile(&self, schema: &str) -> Result<CompiledSchema, Report<SchemaDiagnostic>>;
}

impl<T: SchemaCompiler + ?Sized> SchemaCompiler for &T {
    fn compile(&self, schema: &str) -> Result<CompiledSchema, Report<SchemaDiagnostic>> {
        (**self).compile(schema)
    }
}
