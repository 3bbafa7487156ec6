//! Covenant compiler CLI.
//!
//! Subcommands:
//!   tokenize     Print the token stream (debug)
//!   parse        Parse and display an AST summary
//!   check        Parse + verify; print diagnostics and intent hashes
//!   fingerprint  Print per-contract behavioral fingerprints and hashes
//!
//! Exit code 0 on success or warnings-only output; 1 on any lex/parse
//! failure, any ERROR/CRITICAL finding, or unknown command / missing file.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{ContractDef, Program};
use crate::lexer::Lexer;
use crate::verify::{compute_intent_hash, verify_program, Severity};

#[derive(Parser)]
#[command(name = "covenant")]
#[command(about = "The Covenant contract compiler front-end", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the token stream for a source file
    Tokenize {
        /// Covenant source file (.cov)
        file: PathBuf,
    },
    /// Parse a source file and display the AST summary
    Parse {
        /// Covenant source file (.cov)
        file: PathBuf,
    },
    /// Parse and verify; print diagnostics and per-contract intent hashes
    Check {
        /// Covenant source file (.cov)
        file: PathBuf,
    },
    /// Print per-contract fingerprint summaries and intent hashes
    Fingerprint {
        /// Covenant source file (.cov)
        file: PathBuf,
    },
}

/// Entry point for the CLI.
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    // try_parse so that bad usage exits 1, per the documented exit codes
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        let code = if e.use_stderr() { 1 } else { 0 };
        std::process::exit(code);
    });

    match cli.command {
        Commands::Tokenize { file } => cmd_tokenize(&file),
        Commands::Parse { file } => cmd_parse(&file),
        Commands::Check { file } => cmd_check(&file),
        Commands::Fingerprint { file } => cmd_fingerprint(&file),
    }
}

fn load_source(file: &Path) -> Result<(String, String), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("file not found: {}", file.display()).into());
    }
    let source = fs::read_to_string(file)?;
    Ok((source, file.display().to_string()))
}

/// Lex and parse, printing a source-context diagnostic on failure.
fn parse_file(source: &str, filename: &str) -> Result<Program, Box<dyn std::error::Error>> {
    let tokens = match Lexer::new(source, filename).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e.display_with_source(source));
            return Err(e.into());
        }
    };
    match crate::parser::Parser::new(tokens).parse() {
        Ok(program) => Ok(program),
        Err(e) => {
            eprintln!("{}", e.display_with_source(source));
            Err(e.into())
        }
    }
}

fn cmd_tokenize(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (source, filename) = load_source(file)?;
    let tokens = match Lexer::new(&source, &filename).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e.display_with_source(&source));
            return Err(e.into());
        }
    };
    for tok in &tokens {
        println!("{}", tok);
    }
    Ok(())
}

fn cmd_parse(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (source, filename) = load_source(file)?;
    let program = parse_file(&source, &filename)?;
    print_program(&program);
    Ok(())
}

fn cmd_check(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (source, filename) = load_source(file)?;
    let program = parse_file(&source, &filename)?;

    let results = verify_program(&program, &filename);
    for r in &results {
        let loc = if r.file.is_empty() {
            String::new()
        } else {
            format!("{}:{}", r.file, r.line)
        };
        println!(
            "  [{}] {}: {}: contract '{}': {}",
            severity_tag(r.severity),
            r.code,
            loc,
            r.contract_name,
            r.message
        );
    }

    let intent_text = header_intent(&program);
    for contract in &program.contracts {
        let ih = compute_intent_hash(contract, intent_text, None);
        println!("  intent {} -> {}", ih.contract_name, ih.combined_hash);
    }

    let errors = results
        .iter()
        .filter(|r| r.severity >= Severity::Error)
        .count();
    if errors > 0 {
        println!("\n{}: {} finding(s), {} error(s)", filename, results.len(), errors);
        return Err(format!("{} error-level finding(s)", errors).into());
    }
    if results.is_empty() {
        println!("{}: {}", filename, paint("32", "OK"));
    } else {
        println!("\n{}: {} warning(s)", filename, results.len());
    }
    Ok(())
}

fn cmd_fingerprint(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (source, filename) = load_source(file)?;
    let program = parse_file(&source, &filename)?;

    let intent_text = header_intent(&program);
    for contract in &program.contracts {
        print_fingerprint(contract, intent_text)?;
    }
    Ok(())
}

fn print_fingerprint(
    contract: &ContractDef,
    intent_text: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let fp = crate::verify::fingerprint_contract(contract);
    println!("Contract: {}", paint("1", &contract.name));
    print_set("reads", &fp.reads);
    print_set("mutations", &fp.mutations);
    print_set("calls", &fp.calls);
    print_set("emitted_events", &fp.emitted_events);
    print_set("old_references", &fp.old_references);
    print_set("capability_checks", &fp.capability_checks);
    println!(
        "  branching: {}, looping: {}, recursion: {}",
        fp.has_branching, fp.has_looping, fp.has_recursion
    );
    println!(
        "  returns: {}, max nesting depth: {}",
        fp.return_count, fp.max_nesting_depth
    );

    let ih = compute_intent_hash(contract, intent_text, Some(&fp));
    println!("  intent-hash: {}", serde_json::to_string(&ih)?);
    println!();
    Ok(())
}

fn print_set(label: &str, set: &std::collections::BTreeSet<String>) {
    if set.is_empty() {
        return;
    }
    let items: Vec<&str> = set.iter().map(String::as_str).collect();
    println!("  {}: {}", label, items.join(", "));
}

/// Intent text from the file header, or empty when absent.
fn header_intent(program: &Program) -> &str {
    program
        .header
        .as_ref()
        .and_then(|h| h.intent.as_ref())
        .map(|i| i.text.as_str())
        .unwrap_or("")
}

/// Wrap `text` in an ANSI SGR sequence, resetting at the end.
fn paint(sgr: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", sgr, text)
}

fn severity_tag(severity: Severity) -> String {
    match severity {
        Severity::Critical => paint("1;31", "CRITICAL"),
        Severity::Error => paint("31", "ERROR"),
        Severity::Warning => paint("33", "WARNING"),
        Severity::Info => paint("36", "INFO"),
    }
}

fn print_program(program: &Program) {
    if let Some(header) = &program.header {
        if let Some(intent) = &header.intent {
            println!("Intent: \"{}\"", intent.text);
        }
        if let Some(scope) = &header.scope {
            println!("Scope:  {}", scope.path);
        }
        if let Some(risk) = &header.risk {
            println!("Risk:   {}", risk.level);
        }
        if let Some(requires) = &header.requires {
            println!("Requires: {}", requires.capabilities.join(", "));
        }
        println!();
    }

    for td in &program.type_defs {
        println!("Type: {} = {}", td.name, td.base_type);
        for field in &td.fields {
            println!("  field: {}: {}", field.name, field.type_expr);
        }
        for fc in &td.flow_constraints {
            match fc {
                crate::ast::FlowConstraint::NeverFlowsTo { destinations, .. } => {
                    println!("  flow: never_flows_to [{}]", destinations.join(", "));
                }
                crate::ast::FlowConstraint::RequiresContext { context, .. } => {
                    println!("  flow: requires_context {}", context);
                }
            }
        }
        println!();
    }

    for sd in &program.shared_decls {
        println!("Shared: {}: {}", sd.name, sd.type_name);
        println!(
            "  access: {}, isolation: {}, audit: {}",
            sd.access, sd.isolation, sd.audit
        );
        println!();
    }

    for c in &program.contracts {
        let params: Vec<String> = c
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_expr))
            .collect();
        println!("Contract: {}({}) -> {}", c.name, params.join(", "), c.return_type);
        if let Some(pre) = &c.precondition {
            println!("  preconditions: {}", pre.conditions.len());
        }
        if let Some(post) = &c.postcondition {
            println!("  postconditions: {}", post.conditions.len());
        }
        if let Some(effects) = &c.effects {
            println!("  effects: {}", effects.declarations.len());
        }
        if c.permissions.is_some() {
            println!("  permissions: defined");
        }
        if let Some(body) = &c.body {
            println!("  body: {} statement(s)", body.statements.len());
        }
        if let Some(on_failure) = &c.on_failure {
            println!("  on_failure: {} statement(s)", on_failure.statements.len());
        }
        println!();
    }
}
