use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use secrule_parser::{Document, SecRuleError, conf_files, parse, parse_file, tokenize};

#[derive(Parser)]
#[command(name = "secrule")]
#[command(about = "Parse and validate ModSecurity SecRule configuration files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single configuration file and print the AST as JSON
    Parse {
        /// Path to a SecRule configuration file
        path: PathBuf,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Parse every `*.conf` file in a directory and report results
    Validate {
        /// Path to a directory containing configuration files
        path: PathBuf,

        /// Show details for each file (not just summary)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the token stream of a configuration file, one token per line
    Tokens {
        /// Path to a SecRule configuration file
        path: PathBuf,
    },

    /// Read configuration text from stdin and print the parsed AST as JSON
    Stdin {
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { path, pretty } => cmd_parse(path, pretty),
        Commands::Validate { path, verbose } => cmd_validate(path, verbose),
        Commands::Tokens { path } => cmd_tokens(path),
        Commands::Stdin { pretty } => cmd_stdin(pretty),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_parse(path: PathBuf, pretty: bool) {
    match parse_file(&path) {
        Ok(document) => print_json(&document, pretty),
        Err(e) => {
            eprintln!("Error parsing {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn cmd_validate(path: PathBuf, verbose: bool) {
    let files = match conf_files(&path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}: {e}", path.display());
            process::exit(1);
        }
    };

    let mut directives = 0;
    let mut rules = 0;
    let mut failures: Vec<(PathBuf, SecRuleError)> = Vec::new();

    for file in &files {
        log::debug!("validating {}", file.display());
        match parse_file(file) {
            Ok(document) => {
                let (d, r) = counts(&document);
                directives += d;
                rules += r;
                if verbose {
                    println!("  ok    {} ({d} directives)", file.display());
                }
            }
            Err(e) => {
                if verbose {
                    println!("  FAIL  {}", file.display());
                }
                failures.push((file.clone(), e));
            }
        }
    }

    println!("Parsed {} files from {}", files.len(), path.display());
    println!("  Directives:   {directives}");
    println!("  Rules:        {rules}");
    println!("  Parse errors: {}", failures.len());

    if !failures.is_empty() {
        println!("\nErrors:");
        for (file, err) in &failures {
            match err {
                SecRuleError::Io(e) => println!("  - {}: {e}", file.display()),
                _ => println!("  - {err}"),
            }
        }
        process::exit(1);
    }
}

fn cmd_tokens(path: PathBuf) {
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    };

    match tokenize(&path.display().to_string(), &content) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{token}");
            }
        }
        Err(e) => {
            eprintln!("Error parsing {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn cmd_stdin(pretty: bool) {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Error reading stdin: {e}");
        process::exit(1);
    }

    match parse("<stdin>", &input) {
        Ok(document) => print_json(&document, pretty),
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directive and `SecRule` counts of a document.
fn counts(document: &Document) -> (usize, usize) {
    (document.directives().count(), document.rules().count())
}

fn print_json(value: &impl serde::Serialize, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(j) => println!("{j}"),
        Err(e) => {
            eprintln!("JSON serialization error: {e}");
            process::exit(1);
        }
    }
}
