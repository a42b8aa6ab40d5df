//! The end-to-end generation pipeline.

use crate::error::GenerateError;
use crate::source::{SchemaSource, load_schema};
use crate::synth::synthesize_definitions;
use rootcause::prelude::{Report, ResultExt};
use tracing::{debug, instrument};
use zed_typegen_core::SchemaCompiler;

/// Reads `file_name` from `source`, compiles it and returns the TypeScript
/// definition module.
///
/// Nothing is written anywhere; the caller decides what to do with the text.
///
/// # Errors
///
/// Returns [`GenerateError::ReadError`] if the schema cannot be loaded and
/// [`GenerateError::SchemaCompilationError`] if the compiler rejects it. The
/// underlying cause is kept as the report's child.
#[instrument(skip(source, compiler))]
pub fn generate_definition<S, C>(
    source: &S,
    file_name: &str,
    compiler: &C,
) -> Result<String, Report<GenerateError>>
where
    S: SchemaSource + ?Sized,
    C: SchemaCompiler + ?Sized,
{
    let schema = load_schema(source, file_name).context(GenerateError::ReadError {
        file: file_name.to_string(),
    })?;

    let compiled = compiler
        .compile(&schema)
        .context(GenerateError::SchemaCompilationError {
            file: file_name.to_string(),
        })?;

    let definitions = synthesize_definitions(&compiled.object_definitions);
    debug!(
        resource_types = compiled.object_definitions.len(),
        bytes = definitions.len(),
        "definitions generated"
    );
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DirSource, MemorySource};
    use zed_typegen_core::{CompiledSchema, ObjectDefinition, SchemaDiagnostic};
    use zed_typegen_schema::DslCompiler;

    const DOCUMENT_SCHEMA: &str = r#"
/**
 * user represents a user that can be granted role(s)
 */
definition user {}

definition org {
  relation member: user
  relation boss: user

  permission owner = boss
}

/**
 * document represents a document protected by Authzed.
 */
definition document {
    relation writer: user
    relation reader: user

    permission edit = writer
    permission view = reader + edit
}
"#;

    const DOCUMENT_PERMISSION_MAP: &str = r#"type ResourcePermissionMap = {
  user: "",
  org: "owner",
  document: "edit" | "view",
}
"#;

    /// Compiler returning a fixed model regardless of input.
    struct FixedCompiler(Vec<ObjectDefinition>);

    impl SchemaCompiler for FixedCompiler {
        fn compile(&self, _schema: &str) -> Result<CompiledSchema, Report<SchemaDiagnostic>> {
            Ok(CompiledSchema::from_definitions(self.0.clone()))
        }
    }

    #[test]
    fn test_generate_document_schema() {
        let source = MemorySource::new().with_file("schema.zed", DOCUMENT_SCHEMA);
        let output =
            generate_definition(&source, "schema.zed", &DslCompiler::new()).expect("should generate");

        assert!(output.starts_with("import { v1 } from \"@authzed/authzed-node\";\n\n"));
        assert!(output.contains(DOCUMENT_PERMISSION_MAP), "{output}");
        assert!(output.contains("\ntype ResourceType = keyof ResourcePermissionMap;\n\n"));
        assert!(output.ends_with("};"));
    }

    #[test]
    fn test_generate_matches_direct_synthesis() {
        let source = MemorySource::new().with_file("schema.zed", DOCUMENT_SCHEMA);
        let output =
            generate_definition(&source, "schema.zed", &DslCompiler::new()).expect("should generate");

        let expected = synthesize_definitions(&[
            ObjectDefinition::new("user"),
            ObjectDefinition::new("org")
                .with_relation("member")
                .with_relation("boss")
                .with_permission("owner"),
            ObjectDefinition::new("document")
                .with_relation("writer")
                .with_relation("reader")
                .with_permission("edit")
                .with_permission("view"),
        ]);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_generate_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("schema.zed"), DOCUMENT_SCHEMA).expect("write");

        let source = DirSource::new(dir.path());
        let output =
            generate_definition(&source, "schema.zed", &DslCompiler::new()).expect("should generate");
        assert!(output.contains(DOCUMENT_PERMISSION_MAP));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let source = MemorySource::new().with_file("schema.zed", DOCUMENT_SCHEMA);
        let compiler = DslCompiler::new();
        let first = generate_definition(&source, "schema.zed", &compiler).expect("first");
        let second = generate_definition(&source, "schema.zed", &compiler).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let source = MemorySource::new();
        let err = generate_definition(&source, "missing.zed", &DslCompiler::new())
            .expect_err("should fail");
        assert_eq!(
            err.current_context(),
            &GenerateError::ReadError {
                file: "missing.zed".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_name_is_read_error() {
        let source = MemorySource::new().with_file("schema.zed", DOCUMENT_SCHEMA);
        let err = generate_definition(&source, "../schema.zed", &DslCompiler::new())
            .expect_err("should fail");
        assert!(matches!(
            err.current_context(),
            GenerateError::ReadError { file } if file == "../schema.zed"
        ));
    }

    #[test]
    fn test_syntax_error_is_compilation_error() {
        let source =
            MemorySource::new().with_file("schema.zed", "definition user {\n  relation boss: user\n");
        let err = generate_definition(&source, "schema.zed", &DslCompiler::new())
            .expect_err("should fail");
        assert_eq!(
            err.current_context(),
            &GenerateError::SchemaCompilationError {
                file: "schema.zed".to_string()
            }
        );
        assert!(err.to_string().contains("error compiling schema 'schema.zed'"));
    }

    #[test]
    fn test_semantic_error_is_compilation_error() {
        let source = MemorySource::new()
            .with_file("schema.zed", "definition doc {\n  relation viewer: user\n}");
        let err = generate_definition(&source, "schema.zed", &DslCompiler::new())
            .expect_err("should fail");
        assert!(matches!(
            err.current_context(),
            GenerateError::SchemaCompilationError { .. }
        ));
    }

    #[test]
    fn test_generate_with_custom_compiler() {
        let source = MemorySource::new().with_file("anything.txt", "not a schema");
        let compiler = FixedCompiler(vec![ObjectDefinition::new("team").with_permission("join")]);
        let output = generate_definition(&source, "anything.txt", &compiler).expect("should generate");
        assert!(output.contains("type ResourcePermissionMap = {\n  team: \"join\",\n}\n"));
    }

    #[test]
    fn test_compiler_sees_file_contents() {
        struct Recorder(std::cell::RefCell<Option<String>>);

        impl SchemaCompiler for Recorder {
            fn compile(&self, schema: &str) -> Result<CompiledSchema, Report<SchemaDiagnostic>> {
                *self.0.borrow_mut() = Some(schema.to_string());
                Ok(CompiledSchema::default())
            }
        }

        let source = MemorySource::new().with_file("schema.zed", "definition user {}");
        let recorder = Recorder(std::cell::RefCell::new(None));
        generate_definition(&source, "schema.zed", &recorder).expect("should generate");
        assert_eq!(recorder.0.borrow().as_deref(), Some("definition user {}"));
    }
}
