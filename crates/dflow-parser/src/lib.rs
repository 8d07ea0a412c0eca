/*! Read Bril programs from JSON or from the text form.
 *
 * JSON is the canonical interchange format and maps straight onto the `serde` types in
 * `dflow-core`. The text form (`@main { v: int = const 1; ... }`) is parsed with a pest grammar
 * and lowered to the same types, so everything downstream sees one representation.
 */

use dflow_core::Program;
use pest::Parser;
use pest_derive::Parser;
use std::io::Read;
use std::path::Path;

mod error;
mod text;

pub use error::{ParseError, Result};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct BrilParser;

/// Which reader to use for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// Text for `.bril` files, JSON for everything else.
    #[default]
    Auto,
    Json,
    Text,
}

impl Syntax {
    /// Settle `Auto` for an input at `path` (`None` is stdin, which defaults to JSON).
    pub fn resolve(self, path: Option<&Path>) -> Syntax {
        match self {
            Syntax::Auto => match path.and_then(|p| p.extension()) {
                Some(ext) if ext == "bril" => Syntax::Text,
                _ => Syntax::Json,
            },
            explicit => explicit,
        }
    }
}

pub fn parse_json(input: &str) -> Result<Program> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_text(input: &str) -> Result<Program> {
    let mut pairs = BrilParser::parse(Rule::program, input).map_err(Box::new)?;
    match pairs.next() {
        Some(program) => text::program(program),
        None => Ok(Program::default()),
    }
}

pub fn parse(input: &str, syntax: Syntax) -> Result<Program> {
    match syntax {
        Syntax::Text => parse_text(input),
        Syntax::Json => parse_json(input),
        Syntax::Auto if input.trim_start().starts_with('{') => parse_json(input),
        Syntax::Auto => parse_text(input),
    }
}

/// Read and parse the program at `path`, or from stdin when `path` is `None`.
pub fn load(path: Option<&Path>, syntax: Syntax) -> Result<Program> {
    let input = match path {
        Some(p) => std::fs::read_to_string(p).map_err(|source| ParseError::Io {
            path: p.display().to_string(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| ParseError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            buf
        }
    };
    parse(&input, syntax.resolve(path))
}
