use clap::{Args, Parser, Subcommand};
use nixvm_parser::{Diagnostic, Parse, ParseOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Parsed when neither a path nor `--expr` is given.
const DEMO_SOURCE: &str = "let x = 1; in x";

#[derive(Parser)]
#[command(name = "nixvm")]
#[command(about = "nixvm: parse Nix expressions and print their syntax tree")]
#[command(version)]
struct Cli {
    /// Deepest expression nesting to accept
    #[arg(long, global = true, default_value_t = ParseOptions::default().max_depth)]
    max_depth: usize,

    /// Treat `#`, `//` and `/* */` as ordinary input instead of comments
    #[arg(long, global = true)]
    no_comments: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the syntax tree of an expression
    Print(InputArgs),

    /// Check an expression for syntax errors without printing the tree
    Check(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Input file
    path: Option<PathBuf>,

    /// Expression text to parse instead of a file
    #[arg(long, conflicts_with = "path")]
    expr: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} syntax error(s)")]
    Syntax(usize),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ParseOptions::default()
        .with_max_depth(cli.max_depth)
        .with_comments(!cli.no_comments);

    let result = match &cli.command {
        Command::Print(input) => cmd_print(input, options),
        Command::Check(input) => cmd_check(input, options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(input: &InputArgs) -> Result<String, CliError> {
    if let Some(expr) = &input.expr {
        return Ok(expr.clone());
    }
    match &input.path {
        Some(path) => read_file(path),
        None => Ok(DEMO_SOURCE.to_string()),
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn report(diagnostics: &[Diagnostic]) -> Result<(), CliError> {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(CliError::Syntax(diagnostics.len()))
    }
}

fn cmd_print(input: &InputArgs, options: ParseOptions) -> Result<(), CliError> {
    let source = read_source(input)?;
    let Parse { expr, diagnostics } = nixvm_parser::Parser::parse_with(&source, options);
    println!("{expr}");
    report(&diagnostics)
}

fn cmd_check(input: &InputArgs, options: ParseOptions) -> Result<(), CliError> {
    let source = read_source(input)?;
    let parsed = nixvm_parser::Parser::parse_with(&source, options);
    report(&parsed.diagnostics)?;
    eprintln!("OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(path: Option<&str>, expr: Option<&str>) -> InputArgs {
        InputArgs {
            path: path.map(PathBuf::from),
            expr: expr.map(String::from),
        }
    }

    #[test]
    fn test_demo_source_when_no_input() {
        assert_eq!(read_source(&input(None, None)).unwrap(), DEMO_SOURCE);
    }

    #[test]
    fn test_inline_expression() {
        assert_eq!(read_source(&input(None, Some("[1 2]"))).unwrap(), "[1 2]");
    }

    #[test]
    fn test_missing_file() {
        let err = read_source(&input(Some("/nonexistent/nixvm/input.nix"), None)).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/nixvm/input.nix"));
    }

    #[test]
    fn test_demo_source_parses() {
        let parsed = nixvm_parser::parse(DEMO_SOURCE);
        assert!(parsed.is_ok());
        assert_eq!(parsed.expr.to_string(), "(let x = 1; in x)");
    }

    #[test]
    fn test_report_counts_diagnostics() {
        let parsed = nixvm_parser::parse("[1, 2");
        let err = report(&parsed.diagnostics).unwrap_err();
        assert_eq!(err.to_string(), "1 syntax error(s)");
        assert!(report(&[]).is_ok());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "nixvm",
            "print",
            "--expr",
            "x",
            "--max-depth",
            "8",
            "--no-comments",
        ])
        .unwrap();
        assert_eq!(cli.max_depth, 8);
        assert!(cli.no_comments);
        assert!(matches!(cli.command, Command::Print(ref args) if args.expr.as_deref() == Some("x")));
    }
}
