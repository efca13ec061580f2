mod config;
mod error;
mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use restgen_compiler::Compiler;
use restgen_emit::{DependenciesEmitter, RoutesEmitter};
use restgen_merge::{MergeResult, Merger};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::CliError;
use crate::format::{FORMAT_TIMEOUT, Formatter};

const DEPENDENCIES_FILE: &str = "dependencies.go";

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "restgen")]
#[command(about = "Generate REST routes from SDL schemas", version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate routes from schemas.
    Generate(GenerateArgs),
    /// Initialize with example config and schema.
    Init,
    /// Compile one schema and print its IR.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Path to config file.
    #[arg(short, long, default_value = "restgen.yaml")]
    config: PathBuf,
    /// Skip running goimports/gofmt on the output.
    #[arg(long)]
    no_format: bool,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Schema file to compile.
    file: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Init => run_init(),
        Command::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let config = Config::load(&args.config)?;
    let schemas = expand_schemas(&config.schemas)?;
    if schemas.is_empty() {
        return Err(CliError::NoSchemas {
            patterns: config.schemas.clone(),
        });
    }

    fs::create_dir_all(&config.output).map_err(|err| CliError::write(&config.output, err))?;
    write_dependencies(&config)?;

    let mut compiler = Compiler::new();
    let emitter = RoutesEmitter::new(config.emit_options());
    let merger = Merger::new();
    let mut failed = 0usize;

    for schema in &schemas {
        println!("Processing {}...", schema.display());
        match generate_schema(&mut compiler, &emitter, &merger, &config.output, schema) {
            Ok((path, result)) => report(&path, &result),
            Err(err) => {
                eprintln!("error: {err}");
                failed += 1;
            }
        }
    }

    if !args.no_format {
        println!("Formatting generated files...");
        let formatter = Formatter::detect();
        if let Err(err) = formatter.run(&config.output, FORMAT_TIMEOUT) {
            println!(
                "  warning: {} on {} failed: {err}",
                formatter.name(),
                config.output.display()
            );
        }
    }

    if failed > 0 {
        return Err(CliError::SchemasFailed {
            failed,
            total: schemas.len(),
        });
    }
    println!("Done!");
    Ok(())
}

/// Expands every pattern in order, dropping duplicates.
fn expand_schemas(patterns: &[String]) -> Result<Vec<PathBuf>, CliError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|source| CliError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in entries {
            match entry {
                Ok(path) if !paths.contains(&path) => paths.push(path),
                Ok(_) => {}
                Err(err) => warn!(pattern = %pattern, error = %err, "Skipping unreadable match"),
            }
        }
    }
    debug!(count = paths.len(), "Expanded schema patterns");
    Ok(paths)
}

/// Writes the dependencies scaffold unless it already exists.
fn write_dependencies(config: &Config) -> Result<(), CliError> {
    let path = config.output.join(DEPENDENCIES_FILE);
    if path.exists() {
        debug!(path = %path.display(), "Dependencies file exists; leaving it alone");
        return Ok(());
    }
    let content = DependenciesEmitter::new(&config.package).emit();
    fs::write(&path, content).map_err(|err| CliError::write(&path, err))?;
    println!("→ {} (new)", path.display());
    Ok(())
}

fn generate_schema(
    compiler: &mut Compiler,
    emitter: &RoutesEmitter,
    merger: &Merger,
    output: &Path,
    schema_path: &Path,
) -> Result<(PathBuf, MergeResult), CliError> {
    let schema = compiler.compile_file(schema_path)?;
    let stem = schema.file_stem().unwrap_or("schema");
    let target = output.join(format!("{stem}_routes.go"));

    let generated = emitter.emit(&schema);
    let result = merger.merge_file(&generated, &target)?;
    fs::write(&target, &result.content).map_err(|err| CliError::write(&target, err))?;
    Ok((target, result))
}

fn report(path: &Path, result: &MergeResult) {
    println!("  → {}", path.display());
    for (label, names) in [
        ("preserved", &result.preserved),
        ("removed", &result.removed),
        ("reinstated", &result.reinstated),
        ("discarded", &result.discarded),
    ] {
        if !names.is_empty() {
            println!("    {label}: {}", names.join(", "));
        }
    }
}

fn run_parse(args: ParseArgs) -> Result<(), CliError> {
    let schema = Compiler::new().compile_file(&args.file)?;
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&*schema)?,
        OutputFormat::Yaml => serde_yaml::to_string(&*schema)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

const EXAMPLE_CONFIG: &str = "\
# restgen configuration
package: routes
output: ./routes

models:
  package: github.com/yourorg/yourapp/models

scalars:
  Time: time.Time
  ID: string
  Decimal: decimal.Decimal

schemas:
  - ./schemas/*.sdl
";

const EXAMPLE_SCHEMA: &str = r#"# @base("/v1/contacts")
# @models("github.com/yourorg/yourapp/models")

type Calls {
    createContact(input: CreateContactInput!): Contact @post("/")
    getContact(id: ID!): Contact @get("/{id}")
    updateContact(id: ID!, input: UpdateContactInput!): Contact @put("/{id}")
    deleteContact(id: ID!): DeleteResult @delete("/{id}")
    listContacts(filter: ContactFilter): ContactList @get("/")
}

type Contact {
    id: ID!
    name: String!
    email: String!
    status: ContactStatus!
    createdAt: Time!
}

enum ContactStatus {
    ACTIVE
    ARCHIVED
}

input CreateContactInput {
    name: String!
    email: String!
}

input UpdateContactInput {
    name: String
    email: String
}

input ContactFilter {
    search: String
    limit: Int
    offset: Int
}

type ContactList {
    items: [Contact!]!
    total: Int!
}

type DeleteResult {
    success: Boolean!
}
"#;

fn run_init() -> Result<(), CliError> {
    write_example(Path::new("restgen.yaml"), EXAMPLE_CONFIG)?;

    let schemas = Path::new("schemas");
    fs::create_dir_all(schemas).map_err(|err| CliError::write(schemas, err))?;
    write_example(&schemas.join("contacts.sdl"), EXAMPLE_SCHEMA)?;

    println!("\nRun 'restgen generate' to generate routes.");
    Ok(())
}

/// Writes an example file, never replacing an existing one.
fn write_example(path: &Path, content: &str) -> Result<(), CliError> {
    if path.exists() {
        println!("Skipped {} (already exists)", path.display());
        return Ok(());
    }
    fs::write(path, content).map_err(|err| CliError::write(path, err))?;
    println!("Created {}", path.display());
    Ok(())
}
