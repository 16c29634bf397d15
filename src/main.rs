// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for chat2html.
//!
//! This binary provides the `chat2html` command for converting plain-text
//! chat transcripts into self-contained HTML pages.

use chat2html::{parser, renderer};
use chrono::Local;
use lexopt::prelude::*;
use snafu::{OptionExt, ensure, prelude::*};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Write each file to the specified directory.
    Directory(PathBuf),
    /// Write each file next to its input.
    BesideInput,
    /// Write to stdout.
    Stdout,
}

/// What to produce for each transcript.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Format {
    Html,
    Json,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

struct Cli {
    input: Vec<PathBuf>,
    /// `None` means the user is asked once.
    output: Option<OutputTarget>,
    format: Format,
    labels: parser::ParseOptions,
    quiet: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required (see --help)"))]
    NoInputFiles,

    #[snafu(display("no .txt transcripts found in directory {}", path.display()))]
    NoTranscripts { path: PathBuf },

    #[snafu(display("input file not found: {}", path.display()))]
    InputNotFound { path: PathBuf },

    #[snafu(display("cannot output multiple files to stdout"))]
    MultipleFilesToStdout,

    #[snafu(display("failed to read output directory from stdin: {source}"))]
    Prompt { source: io::Error },

    #[snafu(display("could not create output directory {}: {source}", path.display()))]
    CreateOutputDir { path: PathBuf, source: io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile { path: PathBuf, source: io::Error },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("invalid input filename: no file stem"))]
    InvalidFilename,

    #[snafu(display("failed to serialize {}: {source}", path.display()))]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile { path: PathBuf, source: io::Error },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert plain-text chat transcripts to self-contained HTML

Usage: {name} [OPTIONS] <INPUT>...

Arguments:
  <INPUT>...  Transcript files, or directories containing .txt transcripts

Options:
  -o, --output <DIR>           Output directory (- for stdout); asked for if omitted
      --format <FORMAT>        html or json (default: html)
      --human-label <LABEL>    Label starting human turns (default: Human)
      --assistant-label <LABEL>
                               Label starting assistant turns (default: Claude)
  -q, --quiet                  Suppress progress messages
  -h, --help                   Print help
  -V, --version                Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

/// Rejects labels that could never start a line.
fn check_label(label: String) -> Result<String, lexopt::Error> {
    if label.is_empty() || label.contains('\n') {
        return Err("labels must be non-empty and fit on one line".into());
    }
    Ok(label)
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut input = Vec::new();
    let mut output: Option<OutputTarget> = None;
    let mut format = Format::Html;
    let mut labels = parser::ParseOptions::default();
    let mut quiet = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = Some(if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::Directory(val)
                });
            }
            Long("format") => {
                format = match parser.value()?.string()?.as_str() {
                    "html" => Format::Html,
                    "json" => Format::Json,
                    other => {
                        return Err(format!("unknown format '{other}' (expected html or json)").into());
                    }
                };
            }
            Long("human-label") => labels.human_label = check_label(parser.value()?.string()?)?,
            Long("assistant-label") => {
                labels.assistant_label = check_label(parser.value()?.string()?)?;
            }
            Short('q') | Long("quiet") => quiet = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        format,
        labels,
        quiet,
    })
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let files = collect_input_files(&cli.input, cli.quiet)?;

    let target = match &cli.output {
        Some(target) => target.clone(),
        None => prompt_output_target(&files)?,
    };
    if matches!(target, OutputTarget::Stdout) {
        ensure!(files.len() == 1, MultipleFilesToStdoutSnafu);
    }

    for file in &files {
        process_file(file, &target, &cli)?;
    }

    if !cli.quiet && !matches!(target, OutputTarget::Stdout) {
        eprintln!("Conversion complete!");
    }
    Ok(())
}

/// Collects all transcript files from the given inputs (files and directories).
///
/// Directory entries that cannot be read are reported and skipped; a directory
/// without any `.txt` file is an error.
fn collect_input_files(inputs: &[PathBuf], quiet: bool) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for input in inputs {
        ensure!(input.exists(), InputNotFoundSnafu { path: input });
        if input.is_dir() {
            let before = files.len();
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        if !quiet {
                            eprintln!("Skipping unreadable entry: {err}");
                        }
                        continue;
                    }
                };
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "txt")
                {
                    files.push(entry.into_path());
                }
            }
            ensure!(files.len() > before, NoTranscriptsSnafu { path: input });
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Asks once where the documents should go. A blank answer (or end of input)
/// keeps each document next to its transcript.
fn prompt_output_target(files: &[PathBuf]) -> Result<OutputTarget, Error> {
    if let [file] = files {
        println!("Input file: {}", file.display());
    } else {
        println!("Input files: {}", files.len());
    }
    print!("Enter output directory (leave blank for same as input): ");
    io::stdout().flush().context(PromptSnafu)?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).context(PromptSnafu)?;

    let answer = answer.trim();
    Ok(if answer.is_empty() {
        OutputTarget::BesideInput
    } else {
        OutputTarget::Directory(PathBuf::from(answer))
    })
}

/// Renders a parsed transcript in the requested format.
fn render(
    transcript: &parser::Transcript,
    input: &Path,
    stem: &str,
    format: Format,
) -> Result<String, Error> {
    match format {
        Format::Html => {
            let opts = renderer::RenderOptions {
                title: format!("Conversation Log - {stem}"),
                annotation: Some(format!(
                    "Generated from: {} on {}",
                    input.display(),
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                )),
            };
            Ok(renderer::render_document(&transcript.messages, &opts))
        }
        Format::Json => {
            let mut json = serde_json::to_string_pretty(transcript)
                .context(SerializeSnafu { path: input })?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Converts a single transcript and writes it to the output target.
fn process_file(input: &Path, target: &OutputTarget, cli: &Cli) -> Result<(), Error> {
    let text = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let transcript =
        parser::parse_transcript(&text, &cli.labels).context(ParseFileSnafu { path: input })?;

    if transcript.strategy == parser::Strategy::Paragraphs && !cli.quiet {
        eprintln!(
            "No labelled turns found in {}; treating paragraphs as alternating turns",
            input.display()
        );
    }

    let stem = input.file_stem().context(InvalidFilenameSnafu)?.to_string_lossy();
    let document = render(&transcript, input, &stem, cli.format)?;

    let out_dir = match target {
        OutputTarget::Stdout => {
            print!("{document}");
            return Ok(());
        }
        OutputTarget::Directory(dir) => dir.as_path(),
        OutputTarget::BesideInput => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    };

    if !out_dir.exists() {
        if !cli.quiet {
            eprintln!(
                "Output directory {} doesn't exist. Creating it...",
                out_dir.display()
            );
        }
        std::fs::create_dir_all(out_dir).context(CreateOutputDirSnafu { path: out_dir })?;
    }

    let out_path = out_dir.join(format!("{stem}.{}", cli.format.extension()));
    std::fs::write(&out_path, &document).context(WriteFileSnafu { path: &out_path })?;

    if !cli.quiet {
        eprintln!(
            "Wrote {} ({} messages)",
            out_path.display(),
            transcript.messages.len()
        );
    }
    Ok(())
}
