//! Dadl - configuration language utility tool
//!
//! A simple but extendable configuration language that allows describing
//! complex structures using custom DSLs while preserving readability.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use tracing::error;

use dadl_parser::{parse_schema, FsResourceProvider, Parser, Value};

mod print;

#[derive(ClapParser, Debug)]
#[command(name = "dadl")]
#[command(about = "Dadl is a configuration language and a utility tool")]
#[command(version = dadl_parser::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print data from the given file as a tree
    Print { file: PathBuf },
    /// Export a parsed file to another format
    Export {
        file: PathBuf,
        /// Format of the exported output
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },
    /// Validate the given dadl file
    Validate { file: PathBuf },
    /// Describe the given dadl schema file
    Describe { file: PathBuf },
    /// Generate sample data for the given schema file
    Sample { file: PathBuf },
    /// Print the version number of Dadl
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Json,
    Yaml,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            eprintln!("Err: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Print { file } => {
            let tree = parse_file(&file)?;
            print!("{}", print::render_tree(&tree));
            Ok(())
        }
        Command::Export { file, format } => {
            let tree = parse_file(&file)?;
            let rendered = match format {
                ExportFormat::Json => {
                    serde_json::to_string_pretty(&tree).map_err(|e| e.to_string())?
                }
                ExportFormat::Yaml => serde_yaml::to_string(&tree).map_err(|e| e.to_string())?,
            };
            print!("{}", rendered);
            Ok(())
        }
        Command::Validate { file } => {
            parse_file(&file)?;
            println!("{}: OK", file.display());
            Ok(())
        }
        Command::Describe { file } => describe(&file),
        Command::Sample { file } => {
            let _ = load_schema(&file)?;
            println!("sample generation is not implemented yet");
            Ok(())
        }
        Command::Version => {
            println!("Dadl {}", dadl_parser::VERSION);
            Ok(())
        }
    }
}

fn parse_file(path: &Path) -> Result<Value, String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resources = FsResourceProvider::new(base);
    Parser::new()
        .parse(file, &resources)
        .map_err(|e| e.to_string())
}

fn load_schema(path: &Path) -> Result<dadl_parser::Schema, String> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("invalid schema path: {}", path.display()))?;
    let resources = FsResourceProvider::new(base);
    parse_schema(name, &resources).map_err(|e| e.to_string())
}

/// List the declared types and root structure of a schema file.
fn describe(path: &Path) -> Result<(), String> {
    use dadl_parser::schema_ast::{self, TypeDef};

    let tree = parse_file(path)?;
    let ast = schema_ast::decode(&tree).map_err(|e| e.to_string())?;

    fn form_name(def: &TypeDef) -> &str {
        match def {
            TypeDef::Str { .. } => "string",
            TypeDef::Identifier => "identifier",
            TypeDef::Int { .. } => "int",
            TypeDef::Number => "number",
            TypeDef::Bool => "bool",
            TypeDef::Enum { .. } => "enum",
            TypeDef::Formula { .. } => "formula",
            TypeDef::Sequence { .. } => "sequence",
            TypeDef::List { .. } => "list",
            TypeDef::Map { .. } => "map",
            TypeDef::Struct { .. } => "struct",
            TypeDef::Oneof { .. } => "oneof",
            TypeDef::Complex { .. } => "complex",
            TypeDef::Ref { type_name } => type_name,
        }
    }

    if !ast.types.is_empty() {
        println!("types:");
        for (name, def) in &ast.types {
            println!("  {} {}", name, form_name(def));
        }
    }
    if !ast.structure.is_empty() {
        println!("structure:");
        for (name, def) in &ast.structure {
            println!("  {} {}", name, form_name(def));
        }
    }
    Ok(())
}
