//! Convert a document between formats from the command line.
//!
//! Run with: cargo run --example convert -- [INPUT] [OUTPUT] [--from FMT] [--to FMT] [--query PATH] [--prefix PATH] [--pretty]
//!
//! Missing INPUT reads standard input, missing OUTPUT writes standard
//! output. Without `--from` the input format is detected; without `--to`
//! the output format follows OUTPUT's extension, falling back to JSON.

use config_formats::{read, write, Conversion, NormalizationPolicy};
use std::error::Error;
use std::path::PathBuf;

#[derive(Default)]
struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    from: Option<String>,
    to: Option<String>,
    conversion: Conversion,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{} needs a value", arg));
        match arg.as_str() {
            "--from" => args.from = Some(value()?),
            "--to" => args.to = Some(value()?),
            "--query" => args.conversion.query = Some(value()?),
            "--prefix" => args.conversion.prefix = Some(value()?),
            "--pretty" => args.conversion.pretty = true,
            "--parse-strings" => {
                args.conversion.policy = Some(
                    NormalizationPolicy::new()
                        .with_parse_str(true)
                        .with_parse_date(true)
                        .with_allow_date(true),
                );
            }
            _ if args.input.is_none() => args.input = Some(PathBuf::from(&arg)),
            _ if args.output.is_none() => args.output = Some(PathBuf::from(&arg)),
            _ => return Err(format!("unexpected argument {:?}", arg).into()),
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;

    let detected = read(args.input.as_deref(), args.from.as_deref())?;
    eprintln!("read {} input", detected.codec.label());

    let registry = config_formats::registry::global();
    let value = args.conversion.project(registry, detected.value)?;

    write(
        args.output.as_deref(),
        args.to.as_deref(),
        &value,
        args.conversion.pretty,
    )?;
    Ok(())
}
