//! The `zed-typegen` command line.
//!
//! Reads a SpiceDB schema from a folder, compiles it and prints the
//! TypeScript permission definitions for `@authzed/authzed-node`.

pub mod config;
pub mod error;

use crate::config::TypegenConfig;
use crate::error::CliError;
use clap::{ArgAction, Parser};
use rootcause::prelude::{Report, ResultExt};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use zed_typegen_codegen::{DirSource, generate_definition};
use zed_typegen_schema::DslCompiler;

/// Generate TypeScript permission definitions from a SpiceDB schema.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "zed-typegen", version, about)]
pub struct Cli {
    /// Folder containing the schema file.
    #[arg(value_name = "FOLDER", value_parser = non_blank::<PathBuf>)]
    pub folder: PathBuf,

    /// Schema file name, relative to the folder.
    #[arg(value_name = "SCHEMA_FILE", value_parser = non_blank::<String>)]
    pub schema_file: String,

    /// Write the definitions to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn non_blank<T: From<String>>(value: &str) -> Result<T, String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(T::from(value.to_string()))
    }
}

/// Picks the log filter directive.
///
/// `RUST_LOG` wins over `-v`, which wins over the configured filter.
fn filter_directive(rust_log: Option<String>, verbose: u8, configured: &str) -> String {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directive;
    }
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global tracing subscriber, logging to stderr.
///
/// # Errors
///
/// Returns [`CliError::Configuration`] if the filter directive is invalid.
pub fn init_logging(cli: &Cli, config: &TypegenConfig) -> Result<(), Report<CliError>> {
    let directive = filter_directive(
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        cli.verbose,
        &config.log.filter,
    );
    let filter = EnvFilter::try_new(&directive).context(CliError::Configuration)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(config.log.ansi),
        )
        .init();
    Ok(())
}

/// Generates the definitions for `cli` and writes them out.
///
/// With `--output` the file is only created once generation succeeded;
/// otherwise the definitions go to `stdout`. Either way they end with a
/// newline.
///
/// # Errors
///
/// Returns [`CliError::Generation`] if the schema cannot be read or compiled
/// and [`CliError::Output`] if writing fails.
#[instrument(skip(cli, stdout), fields(folder = %cli.folder.display(), schema_file = %cli.schema_file))]
pub fn run<W: Write>(cli: &Cli, stdout: &mut W) -> Result<(), Report<CliError>> {
    let source = DirSource::new(&cli.folder);
    let definitions = generate_definition(&source, &cli.schema_file, &DslCompiler::new())
        .context(CliError::Generation)?;
    debug!(bytes = definitions.len(), "definitions ready");

    match &cli.output {
        Some(path) => {
            std::fs::write(path, format!("{definitions}\n")).context(CliError::Output {
                destination: path.display().to_string(),
            })?;
            info!(path = %path.display(), "definitions written");
        }
        None => {
            writeln!(stdout, "{definitions}")
                .and_then(|()| stdout.flush())
                .context(CliError::Output {
                    destination: "stdout".to_string(),
                })?;
        }
    }
    Ok(())
}

/// Loads configuration, sets up logging and runs against the real stdout.
///
/// # Errors
///
/// Returns the first failure of any step.
pub fn start(cli: &Cli) -> Result<(), Report<CliError>> {
    let config = TypegenConfig::from_env().context(CliError::Configuration)?;
    init_logging(cli, &config)?;
    run(cli, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const SCHEMA: &str = "definition user {}\n\ndefinition doc {\n  relation reader: user\n  permission view = reader\n}\n";

    fn cli_for(folder: &Path, schema_file: &str) -> Cli {
        Cli {
            folder: folder.to_path_buf(),
            schema_file: schema_file.to_string(),
            output: None,
            verbose: 0,
        }
    }

    #[test]
    fn parses_positional_arguments() {
        let cli = Cli::try_parse_from(["zed-typegen", "schemas", "schema.zed"]).expect("parse");
        assert_eq!(cli.folder, PathBuf::from("schemas"));
        assert_eq!(cli.schema_file, "schema.zed");
        assert_eq!(cli.output, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parses_output_and_verbosity() {
        let cli = Cli::try_parse_from([
            "zed-typegen",
            "-vv",
            "--output",
            "defs.ts",
            "schemas",
            "schema.zed",
        ])
        .expect("parse");
        assert_eq!(cli.output, Some(PathBuf::from("defs.ts")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn blank_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["zed-typegen", "  ", "schema.zed"]).is_err());
        assert!(Cli::try_parse_from(["zed-typegen", "schemas", ""]).is_err());
    }

    #[test]
    fn both_arguments_are_required() {
        let err = Cli::try_parse_from(["zed-typegen", "schemas"]).expect_err("should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn filter_precedence() {
        assert_eq!(filter_directive(Some("trace".into()), 1, "warn"), "trace");
        assert_eq!(filter_directive(Some(" ".into()), 1, "warn"), "info");
        assert_eq!(filter_directive(None, 2, "warn"), "debug");
        assert_eq!(filter_directive(None, 5, "warn"), "trace");
        assert_eq!(filter_directive(None, 0, "error"), "error");
    }

    #[test]
    fn run_prints_definitions_to_stdout() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("schema.zed"), SCHEMA).expect("write");

        let mut stdout = Vec::new();
        run(&cli_for(dir.path(), "schema.zed"), &mut stdout).expect("should run");

        let printed = String::from_utf8(stdout).expect("utf8");
        assert!(printed.contains("  user: \"\",\n  doc: \"view\",\n"), "{printed}");
        assert!(printed.ends_with("};\n"));
    }

    #[test]
    fn run_writes_output_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("schema.zed"), SCHEMA).expect("write");
        let target = dir.path().join("permissions.ts");

        let mut cli = cli_for(dir.path(), "schema.zed");
        cli.output = Some(target.clone());
        let mut stdout = Vec::new();
        run(&cli, &mut stdout).expect("should run");

        assert!(stdout.is_empty());
        let written = std::fs::read_to_string(&target).expect("read output");
        assert!(written.starts_with("import { v1 } from \"@authzed/authzed-node\";\n"));
        assert!(written.ends_with("};\n"));
    }

    #[test]
    fn missing_schema_is_generation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("permissions.ts");

        let mut cli = cli_for(dir.path(), "schema.zed");
        cli.output = Some(target.clone());
        let mut stdout = Vec::new();
        let err = run(&cli, &mut stdout).expect_err("should fail");

        assert_eq!(err.current_context(), &CliError::Generation);
        assert!(stdout.is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn invalid_schema_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("schema.zed"), "definition user {").expect("write");

        let mut stdout = Vec::new();
        let err = run(&cli_for(dir.path(), "schema.zed"), &mut stdout).expect_err("should fail");

        assert_eq!(err.current_context(), &CliError::Generation);
        assert!(stdout.is_empty());
    }

    #[test]
    fn unwritable_output_is_output_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("schema.zed"), SCHEMA).expect("write");

        let mut cli = cli_for(dir.path(), "schema.zed");
        cli.output = Some(dir.path().join("missing-dir").join("permissions.ts"));
        let err = run(&cli, &mut Vec::new()).expect_err("should fail");

        assert!(matches!(
            err.current_context(),
            CliError::Output { destination } if destination.ends_with("permissions.ts")
        ));
    }
}
