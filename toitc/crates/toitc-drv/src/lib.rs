//! toitc-drv - Front-end driver.
//!
//! Loads the given files through the source manager, parses each into a
//! unit (with toitdocs attached), and prints the collected diagnostics as
//! `path:line:column: severity: message`. With `--dump-ast` the parsed
//! trees are rendered through the AST printer.

use std::cell::RefCell;

use anyhow::{bail, Result};

use toitc_lex::{Scanner, SymbolCanonicalizer};
use toitc_par::printer::AstPrinter;
use toitc_par::Parser;
use toitc_util::diagnostic::{Diagnostic, Diagnostics, Handler};
use toitc_util::fs::{Package, StdFilesystem};
use toitc_util::source::SourceManager;

/// Driver configuration, parsed from the command line.
pub struct Config {
    /// The files to parse.
    pub paths: Vec<String>,
    /// Whether to render the parsed trees.
    pub dump_ast: bool,
}

impl Config {
    /// Parses command-line arguments.
    pub fn from_args(args: impl Iterator<Item = String>) -> Result<Config> {
        let mut paths = Vec::new();
        let mut dump_ast = false;
        for arg in args {
            match arg.as_str() {
                "--dump-ast" => dump_ast = true,
                "--help" | "-h" => {
                    println!("usage: toitc [--dump-ast] <file>...");
                    std::process::exit(0);
                }
                _ if arg.starts_with('-') => bail!("unknown option: {}", arg),
                _ => paths.push(arg),
            }
        }
        if paths.is_empty() {
            bail!("no input files");
        }
        Ok(Config { paths, dump_ast })
    }
}

/// Parses all configured files. Returns `true` if no errors were reported.
pub fn run(config: &Config) -> Result<bool> {
    let filesystem = StdFilesystem::new();
    let mut manager = SourceManager::new(&filesystem);
    let handler = Handler::new();
    let symbols = RefCell::new(SymbolCanonicalizer::new());
    let package = Package::entry();

    let mut sources = Vec::new();
    for path in &config.paths {
        let result = manager.load_file(path, &package);
        match result.result {
            Ok(source) => sources.push(source),
            Err(error) => {
                handler.report_error(toitc_util::span::Range::invalid(), error.to_string())
            }
        }
    }

    for source in &sources {
        let scanner = Scanner::new(source, &symbols, &handler);
        let mut parser = Parser::new(source, scanner, &handler);
        let unit = parser.parse_unit();
        if config.dump_ast {
            print!("{}", AstPrinter::new().print_unit(&unit));
        }
    }

    for diagnostic in handler.diagnostics() {
        eprintln!("{}", format_diagnostic(&manager, &diagnostic));
    }

    Ok(!handler.has_errors())
}

fn format_diagnostic(manager: &SourceManager<'_>, diagnostic: &Diagnostic) -> String {
    if diagnostic.range.is_valid() {
        let location = manager.compute_location(diagnostic.range.from());
        format!(
            "{}:{}:{}: {}: {}",
            location.source.error_path(),
            location.line_number,
            location.offset_in_line + 1,
            diagnostic.severity,
            diagnostic.message
        )
    } else {
        format!("{}: {}", diagnostic.severity, diagnostic.message)
    }
}
