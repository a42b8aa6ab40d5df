//! [`SchemaCompiler`] implementation for the SpiceDB schema DSL.

use rootcause::prelude::Report;
use tracing::{debug, instrument};
use zed_typegen_core::{CompiledSchema, SchemaCompiler, SchemaDiagnostic};

use crate::{checker, parser};

/// Compiles SpiceDB schema text into a [`CompiledSchema`].
///
/// The compiler holds no state; one instance can compile any number of
/// schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DslCompiler;

impl DslCompiler {
    /// Creates a new compiler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SchemaCompiler for DslCompiler {
    #[instrument(skip_all, fields(schema_len = schema.len()))]
    fn compile(&self, schema: &str) -> Result<CompiledSchema, Report<SchemaDiagnostic>> {
        let items = parser::parse_schema(schema)?;
        let compiled = checker::check(schema, &items)?;

        debug!(
            definitions = compiled.object_definitions.len(),
            caveats = compiled.caveat_definitions.len(),
            "schema compiled"
        );
        Ok(compiled)
    }
}
