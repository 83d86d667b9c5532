//! CloudFormation Resource Schema CLI
//!
//! Command-line interface for resolving property paths and linting resource
//! provider schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cfn_schema::{
    lint, load_document, normalize_path, FileStatus, LintResult, ResolveOptions, SchemaDocument,
    Severity,
};

#[derive(Parser)]
#[command(name = "cfn-schema")]
#[command(about = "Resolve property paths in CloudFormation resource schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a property path to every shape it can take
    Resolve {
        /// Resource schema file
        schema: PathBuf,

        /// Property path (e.g., /properties/Tags/*/Key)
        path: String,

        /// Drop read-only properties from the resolved shapes
        #[arg(long)]
        exclude_read_only: bool,

        /// Return nothing if any branch is ambiguous
        #[arg(long)]
        require_fully_resolved: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the raw schema value at a path, without resolving anything
    Get {
        /// Resource schema file
        schema: PathBuf,

        /// Path into the schema document (e.g., /definitions/Tag)
        path: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the property categories a path is declared in
    Categories {
        /// Resource schema file
        schema: PathBuf,

        /// Property path; array indices are treated as *
        path: String,
    },

    /// Lint schema files for errors (syntax, broken refs, dangling pointers)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            schema,
            path,
            exclude_read_only,
            require_fully_resolved,
            output,
            pretty,
        } => {
            let options = ResolveOptions::new()
                .exclude_read_only(exclude_read_only)
                .require_fully_resolved(require_fully_resolved);
            run_resolve(&schema, &path, &options, output, pretty)
        }
        Commands::Get {
            schema,
            path,
            pretty,
        } => run_get(&schema, &path, pretty),
        Commands::Categories { schema, path } => run_categories(&schema, &path),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn open(schema: &Path) -> Result<SchemaDocument, u8> {
    load_document(schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn run_resolve(
    schema: &Path,
    path: &str,
    options: &ResolveOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let doc = open(schema)?;
    let resolved = doc.resolve_json_pointer_path(path, options);
    let json_output = to_json(&resolved, pretty)?;

    match output {
        Some(out) => {
            std::fs::write(&out, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", out.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    if resolved.is_empty() {
        eprintln!("Error: path not found: {}", path);
        return Err(1);
    }
    Ok(())
}

fn run_get(schema: &Path, path: &str, pretty: bool) -> Result<(), u8> {
    let doc = open(schema)?;
    let Some(value) = doc.get_by_path(path) else {
        eprintln!("Error: path not found: {}", path);
        return Err(1);
    };
    println!("{}", to_json(&value, pretty)?);
    Ok(())
}

fn run_categories(schema: &Path, path: &str) -> Result<(), u8> {
    let doc = open(schema)?;
    let categories = doc.categories_of(&normalize_path(path));
    println!("{}", to_json(&categories, false)?);
    Ok(())
}

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

fn run_lint(path: &Path, format: Format, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);

    match format {
        Format::Json => println!("{}", to_json(&result, true)?),
        Format::Text => print_lint_report(path, &result, quiet),
    }

    if result.failed == 0 {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_lint_report(path: &Path, result: &LintResult, quiet: bool) {
    if !quiet {
        println!("Linting {} ...\n", path.display());
    }

    for file in &result.results {
        if quiet && file.status == FileStatus::Ok {
            continue;
        }
        let icon = match file.status {
            FileStatus::Ok => format!("{GREEN}✓{RESET}"),
            FileStatus::Warning => format!("{YELLOW}⚠{RESET}"),
            FileStatus::Error => format!("{RED}✗{RESET}"),
        };
        println!("  {} {}", icon, file.file.display());

        for diag in &file.diagnostics {
            let (color, label) = match diag.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning if quiet => continue,
                Severity::Warning => (YELLOW, "warning"),
            };
            println!(
                "    {color}{label}[{}]{RESET}: {} - {}",
                diag.code, diag.path, diag.message
            );
        }
    }

    println!();
    if result.failed == 0 {
        println!(
            "{GREEN}✓ {} files checked, all passed{RESET}",
            result.files_checked
        );
    } else {
        println!(
            "{RED}✗ {} files checked: {} passed, {} failed ({} errors, {} warnings){RESET}",
            result.files_checked, result.passed, result.failed, result.errors, result.warnings
        );
    }
}
