use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::prelude::*;

use outmatch::{CompilerConfig, Options, PrefixRange, compile};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File with the expected output; read from stdin if omitted
    #[arg(value_name = "FILE")]
    expected: Option<String>,

    /// Match any amount of whitespace where the expected output has some
    #[arg(short = 'w', long)]
    norm_ws: bool,

    /// Treat capture tags as plain text
    #[arg(long)]
    no_tags: bool,

    /// Recognise input markers at the end of lines
    #[arg(short = 'i', long)]
    input: bool,

    /// Remove this text from the expected output before compiling (repeatable)
    #[arg(long, value_name = "TEXT")]
    rm: Vec<String>,

    /// Least weight of literal text required before an input
    #[arg(long, value_name = "N", default_value_t = PrefixRange::default().min())]
    prefix_min: usize,

    /// Weight of literal text kept while looking for an input prefix
    #[arg(long, value_name = "N", default_value_t = PrefixRange::default().max())]
    prefix_max: usize,

    /// Match the compiled expected output against this file
    #[arg(short = 'a', long, value_name = "FILE")]
    against: Option<String>,
}

fn read_source(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {path}")),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn main() -> Result<()> {
    // See https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    // for how to select which events get printed.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))
        .context("failed to initialise tracing filter (perhaps there is a problem with environment variables)")?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let args = Args::parse();

    let config = CompilerConfig {
        prefix_range: PrefixRange::new(args.prefix_min, args.prefix_max)?,
        ..CompilerConfig::default()
    };
    let options = Options {
        tags: !args.no_tags,
        input: args.input,
        norm_ws: args.norm_ws,
        rm: args.rm,
    };

    let expected = read_source(args.expected.as_deref())?;
    let compiled = compile(&expected, &options, &config)?;

    let Some(against) = args.against.as_deref() else {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
        return Ok(());
    };

    let output = fs::read_to_string(against).with_context(|| format!("Failed to read {against}"))?;
    let matcher = compiled.matcher()?;
    if let Some(captures) = matcher.captures(&output)? {
        println!("{}", serde_json::to_string_pretty(&captures)?);
        return Ok(());
    }

    let partial = matcher.partial_match(&output)?;
    match partial.failed_at {
        Some(offset) => {
            let line = options
                .strip(&expected)
                .chars()
                .take(offset)
                .filter(|&c| c == '\n')
                .count()
                + 1;
            eprintln!("Output differs from the expected at character {offset} (line {line}).");
        }
        None => eprintln!("Output differs from the expected."),
    }
    std::process::exit(1);
}
