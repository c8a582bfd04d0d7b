//! valueparser CLI - build parser pipelines and run values through them

use anyhow::{Context, Result, bail};
use clap::{Parser as ClapParser, Subcommand};
use std::path::PathBuf;
use valueparser_core::{
    BuildContext, Params, Parser, ParserBuilder, PipelineDocument, Registry, Schema, SpecItem,
    Value,
};

#[derive(ClapParser)]
#[command(name = "valueparser")]
#[command(about = "Composable value parser pipelines", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered parsers and their parameters
    List,

    /// Show the merged parameters of a spec
    Schema {
        /// Comma-separated parser names, e.g. `float,Clipped`
        spec: String,
    },

    /// Parse values through a spec
    Parse {
        /// Comma-separated parser names, e.g. `float,Clipped`
        spec: String,
        /// Parameter override, `key=value` (value decoded as JSON when possible)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Values to parse
        #[arg(allow_negative_numbers = true)]
        values: Vec<String>,
    },

    /// Parse values through a parser declared in a document
    Run {
        /// Pipeline document (YAML, TOML, or JSON)
        document: PathBuf,
        /// Parser name in the document
        parser: String,
        /// Values to parse
        #[arg(allow_negative_numbers = true)]
        values: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    valueparser_builtins::install();
    let registry = Registry::global();

    match cli.command {
        Commands::List => cmd_list(registry),
        Commands::Schema { spec } => cmd_schema(registry, &spec),
        Commands::Parse { spec, set, values } => cmd_parse(registry, &spec, &set, &values),
        Commands::Run {
            document,
            parser,
            values,
        } => cmd_run(&document, &parser, &values),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_list(registry: &Registry) -> Result<()> {
    println!("Available parsers:\n");

    for name in registry.names() {
        let parser_type = registry.resolve(&name)?;
        println!("  {}", name);
        print_fields(parser_type.schema(), "    ");
    }

    println!();
    println!("Total: {} parsers", registry.len());
    Ok(())
}

fn cmd_schema(registry: &Registry, spec: &str) -> Result<()> {
    let parser_type = ParserBuilder::new(registry)
        .build(parse_spec(spec)?, None)
        .context("Failed to build parser type")?;

    println!("{} [{}]", parser_type.name(), parser_type.step_names().join(", "));
    if parser_type.schema().is_empty() {
        println!("  (no parameters)");
    } else {
        print_fields(parser_type.schema(), "  ");
    }
    Ok(())
}

fn cmd_parse(registry: &Registry, spec: &str, set: &[String], values: &[String]) -> Result<()> {
    let mut params = Params::new();
    for assignment in set {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
        params.insert(key.trim().to_string(), decode(value));
    }

    let parser = ParserBuilder::new(registry)
        .parser(parse_spec(spec)?, params)
        .context("Failed to build parser")?;
    parse_all(&parser, values)
}

fn cmd_run(document: &PathBuf, name: &str, values: &[String]) -> Result<()> {
    let data = std::fs::read(document).context("Failed to read document")?;
    let doc = PipelineDocument::from_bytes(&data, Some(&document.to_string_lossy()))
        .map_err(|e| anyhow::anyhow!("Failed to load document: {}", e))?;

    let parser = doc.build(name, &BuildContext::new())?;
    parse_all(&parser, values)
}

fn parse_all(parser: &Parser, values: &[String]) -> Result<()> {
    for input in values {
        match parser.parse(decode(input)) {
            Ok(value) => println!("{}", serde_json::to_string(&value)?),
            Err(e) => bail!("{}: {} ({})", input, e, e.code.as_str()),
        }
    }
    Ok(())
}

/// `float,Clipped` to a list spec; a single name stays a name.
fn parse_spec(spec: &str) -> Result<SpecItem> {
    let names: Vec<&str> = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match names.as_slice() {
        [] => bail!("Empty spec"),
        [name] => Ok(SpecItem::name(*name)),
        many => Ok(SpecItem::list(many.iter().copied())),
    }
}

/// Decode a command-line value as JSON, falling back to a plain string.
fn decode(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_fields(schema: &Schema, indent: &str) {
    for field in schema.fields() {
        let mut line = format!("{}{}: {}", indent, field.name, field.kind.as_str());
        if field.nullable {
            line.push_str(" | null");
        }
        match &field.default {
            Some(default) => line.push_str(&format!(" = {}", default)),
            None => line.push_str(" (required)"),
        }
        if !field.description.is_empty() {
            line.push_str(&format!("  # {}", field.description));
        }
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spec() {
        assert!(matches!(parse_spec("float").unwrap(), SpecItem::Name(n) if n == "float"));
        match parse_spec("float, Clipped").unwrap() {
            SpecItem::List(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected a list"),
        }
        assert!(parse_spec(" , ").is_err());
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("2"), Value::Int(2));
        assert_eq!(decode("2.5"), Value::Float(2.5));
        assert_eq!(decode("[1, 2]"), Value::from(vec![1i64, 2]));
        assert_eq!(decode("abc"), Value::from("abc"));
        assert_eq!(decode("\"2\""), Value::from("2"));
    }
}
