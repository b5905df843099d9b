#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command line renderer for xtmpl templates.
//!
//! Reads a template from a file (or stdin when no file is given), renders it
//! with any `--var` bindings in scope, and writes the output to stdout.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use xtmpl::{load_file, render, Scope, Value};

#[derive(Parser)]
#[command(name = "xtmpl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Template file to render (stdin when omitted)
    file: Option<PathBuf>,

    /// Root scope binding, e.g. `--var count=3` or `--var ratio=0.5`
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let template = match &cli.file {
        Some(path) => load_file(path).map_err(|err| anyhow::anyhow!("{}", err.message()))?,
        None => read_stdin()?,
    };

    let mut scope = Scope::new();
    for var in &cli.vars {
        let (name, value) = parse_binding(var)?;
        scope.set(name, value);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_failed = false;
    let result = render(&template, Some(&scope), |bytes| {
        if out.write_all(bytes).is_err() {
            write_failed = true;
        }
    });

    if let Err(err) = result {
        match (err.row(), err.col()) {
            (Some(row), Some(col)) => bail!("{} (line {row}, column {col})", err.message()),
            _ => bail!("{}", err.message()),
        }
    }
    if write_failed {
        bail!("Failed to write output");
    }
    out.flush().context("Failed to write output")?;
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut template = String::new();
    io::stdin()
        .read_to_string(&mut template)
        .context("Failed to read input")?;
    Ok(template)
}

/// Parses a `name=value` binding. Values holding a `.` become floats,
/// everything else must be a decimal integer.
fn parse_binding(spec: &str) -> Result<(&str, Value)> {
    let Some((name, raw)) = spec.split_once('=') else {
        bail!("Invalid binding [{spec}] (expected NAME=VALUE)");
    };
    if name.is_empty() {
        bail!("Invalid binding [{spec}] (empty variable name)");
    }

    let value = if raw.contains('.') {
        Value::Float(
            raw.parse()
                .with_context(|| format!("Invalid float value [{raw}] for variable [{name}]"))?,
        )
    } else {
        Value::Int(
            raw.parse()
                .with_context(|| format!("Invalid integer value [{raw}] for variable [{name}]"))?,
        )
    };

    Ok((name, value))
}
