//! CLI tool for extracting slide components from PowerPoint files.

use anyhow::{Context, Result};
use clap::Parser;
use deckparse_core::ExtractOptions;
use deckparse_pptx::{Extraction, Extractor, Package};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Extract positioned, styled components from PowerPoint files as JSON.
#[derive(Parser, Debug)]
#[command(name = "deckparse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Emit SmartArt shapes directly instead of diagram wrappers
    #[arg(long)]
    flatten_diagrams: bool,

    /// Do not inline image bytes as data URLs
    #[arg(long)]
    no_media: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::new()
            .with_flatten_diagrams(self.flatten_diagrams)
            .with_embed_media(!self.no_media)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let extractor = Extractor::new(args.extract_options());

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args, &extractor) {
            Ok(output) => {
                if args.print {
                    println!("{}", output);
                } else {
                    let output_path = get_output_path(input_path, args.output.as_ref())?;
                    write_output(&output_path, &output)?;
                    if args.verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

/// Process a single PowerPoint file into serialized JSON.
fn process_file(input_path: &Path, args: &Args, extractor: &Extractor) -> Result<String> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let package = Package::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read package {}", input_path.display()))?;
    log::debug!("Loaded {} parts from {}", package.len(), input_path.display());

    let extraction = extractor.extract(&package);
    if args.verbose {
        report(&extraction);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&extraction)
    } else {
        serde_json::to_string(&extraction)
    }
    .context("Failed to serialize components")?;

    Ok(json)
}

fn report(extraction: &Extraction) {
    eprintln!(
        "  Found {} slides, {} components",
        extraction.slide_count,
        extraction.components.len()
    );
    for diagnostic in &extraction.diagnostics {
        eprintln!(
            "  slide {}: {}: {}",
            diagnostic.slide_index + 1,
            diagnostic.source,
            diagnostic.message
        );
    }
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.json", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_uses_json_extension() {
        let path = get_output_path(Path::new("decks/intro.pptx"), None).unwrap();
        assert_eq!(path, PathBuf::from("decks/intro.json"));
    }

    #[test]
    fn test_flags_map_to_options() {
        let args = Args::parse_from(["deckparse", "a.pptx", "--flatten-diagrams", "--no-media"]);
        let options = args.extract_options();
        assert!(options.flatten_diagrams);
        assert!(!options.embed_media);
        assert!(options.sniff_dimensions);
    }
}
