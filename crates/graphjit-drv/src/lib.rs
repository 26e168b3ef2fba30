//! graphjit-drv - Command-line driver for the expression JIT pipeline.
//!
//! Wires the three stages together: `graphjit-lex` tokenizes,
//! `graphjit-par` parses into an AST, `graphjit-gen` lowers that AST to
//! native code and hands back a callable `(f64) -> f64`. This crate's
//! job is the plumbing around that: argument parsing, diagnostics
//! reporting, and printing results — it holds no compiler logic of its
//! own.
//!
//! # Usage
//!
//! ```text
//! graphjit "sin(x)*2" --min 0 --max 6.28 --samples 8
//! ```

use std::fmt;

use thiserror::Error;
use tracing::{debug, error};

use graphjit_gen::CompiledFunction;
use graphjit_lex::{strip_whitespace, Lexer};
use graphjit_par::{debug_dump_tree, Arena, Parser};
use graphjit_util::Handler;

/// Parsed command-line configuration for one compile-and-evaluate run.
#[derive(Debug, Clone)]
pub struct Config {
    /// The expression source text, e.g. `"sin(x)+2*x"`.
    pub expression: String,
    /// Lower bound of the range to sample `x` over.
    pub min: f64,
    /// Upper bound of the range to sample `x` over.
    pub max: f64,
    /// Number of evenly spaced samples to evaluate in `[min, max]`.
    pub samples: usize,
    /// Print the token stream before parsing.
    pub dump_tokens: bool,
    /// Print the parsed tree before code generation.
    pub dump_ast: bool,
    /// Print progress to stderr as each stage runs.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expression: String::new(),
            min: -10.0,
            max: 10.0,
            samples: 21,
            dump_tokens: false,
            dump_ast: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Parses a `Config` out of `std::env::args()`-style arguments
    /// (excluding `argv[0]`).
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, DriverError> {
        let mut config = Config::default();
        let mut expression = None;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--min" => config.min = parse_flag_value(&mut iter, "--min")?,
                "--max" => config.max = parse_flag_value(&mut iter, "--max")?,
                "--samples" => config.samples = parse_flag_value(&mut iter, "--samples")? as usize,
                "--dump-tokens" => config.dump_tokens = true,
                "--dump-ast" => config.dump_ast = true,
                "--verbose" | "-v" => config.verbose = true,
                other if other.starts_with('-') => {
                    return Err(DriverError::InvalidArguments(format!("unknown flag {other}")))
                }
                other => expression = Some(other.to_string()),
            }
        }

        config.expression =
            expression.ok_or_else(|| DriverError::InvalidArguments("missing expression".into()))?;

        if config.samples < 2 {
            return Err(DriverError::InvalidArguments(
                "--samples must be at least 2".into(),
            ));
        }
        if !(config.max > config.min) {
            return Err(DriverError::InvalidArguments(
                "--max must be greater than --min".into(),
            ));
        }

        Ok(config)
    }
}

fn parse_flag_value(
    iter: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<f64, DriverError> {
    let raw = iter
        .next()
        .ok_or_else(|| DriverError::InvalidArguments(format!("{flag} expects a value")))?;
    raw.parse::<f64>()
        .map_err(|_| DriverError::InvalidArguments(format!("{flag} expects a number, got {raw:?}")))
}

/// Drives one compile-and-evaluate run end to end.
pub struct Session {
    config: Config,
    handler: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: Handler::new(),
        }
    }

    /// Runs the full lex -> parse -> codegen -> evaluate pipeline and
    /// prints the requested output.
    pub fn run(&mut self) -> Result<(), DriverError> {
        debug!(expression = %self.config.expression, "lexing");
        let cleaned = strip_whitespace(&self.config.expression);
        let tokens = Lexer::new(&cleaned, &mut self.handler)
            .lex_all()
            .ok_or_else(|| {
                error!("unbalanced parentheses, lexing aborted");
                DriverError::UnbalancedParens
            })?;

        if self.config.dump_tokens {
            graphjit_lex::debug_dump_tokens(&tokens);
        }

        debug!(count = tokens.len(), "parsing token stream");
        let arena = Arena::new();
        let mut parser = Parser::new(&tokens, &arena, &mut self.handler);
        let ast = parser.parse_expression();

        if self.config.dump_ast {
            let mut out = String::new();
            debug_dump_tree(ast, &mut out).map_err(|e| DriverError::Internal(e.to_string()))?;
            print!("{out}");
        }

        if parser.had_error() || self.handler.has_errors() {
            error!(errors = self.handler.error_count(), "parse failed");
            return Err(DriverError::CompilationFailed(self.handler.error_count()));
        }

        debug!("compiling to native code");
        let compiled = graphjit_gen::compile(ast, "eval").map_err(|e| {
            error!(%e, "code generation failed");
            DriverError::CodeGen(e.to_string())
        })?;

        self.print_samples(&compiled);
        Ok(())
    }

    fn print_samples(&self, compiled: &CompiledFunction) {
        let min = self.config.min;
        let max = self.config.max;
        let samples = self.config.samples;
        let step = (max - min) / (samples - 1) as f64;
        for i in 0..samples {
            let x = min + step * i as f64;
            println!("{x}\t{}", compiled.call(x));
        }
    }
}

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unbalanced parentheses in expression")]
    UnbalancedParens,
    #[error("compilation failed with {0} error(s)")]
    CompilationFailed(usize),
    #[error("code generation failed: {0}")]
    CodeGen(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Entry point called from `main.rs`.
pub fn run() -> anyhow::Result<()> {
    let config = Config::from_args(std::env::args().skip(1))?;
    init_tracing(config.verbose);
    let mut session = Session::new(config);
    session.run()?;
    Ok(())
}

/// Installs a stderr tracing subscriber.
///
/// `--verbose` raises the default filter to `debug`; `RUST_LOG` always
/// takes precedence when set, matching the rest of the toolchain.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} over [{}, {}]", self.expression, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    // ===== argument parsing =====

    #[test]
    fn test_defaults() {
        let config = Config::from_args(args(&["x"])).unwrap();
        assert_eq!(config.expression, "x");
        assert_eq!(config.samples, 21);
    }

    #[test]
    fn test_custom_range_and_samples() {
        let config = Config::from_args(args(&["sin(x)", "--min", "0", "--max", "1", "--samples", "5"]))
            .unwrap();
        assert_eq!(config.min, 0.0);
        assert_eq!(config.max, 1.0);
        assert_eq!(config.samples, 5);
    }

    #[test]
    fn test_missing_expression_is_error() {
        assert!(Config::from_args(args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_unknown_flag_is_error() {
        assert!(Config::from_args(args(&["x", "--bogus"])).is_err());
    }

    #[test]
    fn test_samples_below_two_is_error() {
        assert!(Config::from_args(args(&["x", "--samples", "1"])).is_err());
    }

    #[test]
    fn test_max_not_greater_than_min_is_error() {
        assert!(Config::from_args(args(&["x", "--min", "5", "--max", "5"])).is_err());
    }

    // ===== end to end =====

    #[test]
    fn test_session_evaluates_identity() {
        let config = Config {
            expression: "x".into(),
            min: 0.0,
            max: 10.0,
            samples: 2,
            ..Config::default()
        };
        let mut session = Session::new(config);
        assert!(session.run().is_ok());
    }

    #[test]
    fn test_session_reports_unbalanced_parens() {
        let config = Config {
            expression: "(x".into(),
            ..Config::default()
        };
        let mut session = Session::new(config);
        assert!(matches!(session.run(), Err(DriverError::UnbalancedParens)));
    }

    #[test]
    fn test_session_reports_unknown_identifier() {
        let config = Config {
            expression: "zz".into(),
            ..Config::default()
        };
        let mut session = Session::new(config);
        assert!(matches!(
            session.run(),
            Err(DriverError::CompilationFailed(_))
        ));
    }
}
