//! istrdefs CLI
//!
//! Build-time entry points for interned-string extraction.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use istrdefs_core::{Error, Mode, PreprocessorConfig, SourceSelection};
use istrdefs_extract::{aggregate, generate_header, preprocess, split};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keywords that open a section in the `preprocess` argument list
const SECTIONS: &[&str] = &[
    "pp",
    "output",
    "cflags",
    "cxxflags",
    "sources",
    "changed_sources",
    "dependencies",
];

#[derive(Parser)]
#[command(name = "istrdefs")]
#[command(author, version, about = "Interned-string declaration extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the preprocessor over the selected sources
    #[command(alias = "pp")]
    Preprocess {
        /// Worker count (default: available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// pp <cmd...> output <file> [cflags <flags...>] [cxxflags <flags...>]
        /// [sources <files...>] [changed_sources <files...>] [dependencies <files...>]
        #[arg(
            value_name = "SECTIONS",
            trailing_var_arg = true,
            allow_hyphen_values = true,
            num_args = 1..
        )]
        sections: Vec<String>,
    },

    /// Split a preprocessed stream into per-file artifacts
    Split {
        /// Extraction mode (istr, compress)
        #[arg(value_name = "MODE")]
        mode: String,

        /// Preprocessed stream
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Artifact directory
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,
    },

    /// Merge artifacts into the sorted output, rewriting it only on change
    #[command(alias = "cat")]
    Aggregate {
        /// Extraction mode (istr, compress)
        #[arg(value_name = "MODE")]
        mode: String,

        /// Artifact directory
        #[arg(value_name = "ARTIFACT_DIR")]
        artifact_dir: PathBuf,

        /// Merged output file (digest goes to <OUTPUT_FILE>.hash)
        #[arg(value_name = "OUTPUT_FILE")]
        output: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the header generator on the merged output
    Generate {
        /// Merged output file
        #[arg(value_name = "MERGED")]
        merged: PathBuf,

        /// Generated header
        #[arg(value_name = "HEADER")]
        header: PathBuf,

        /// Generator command, after `--`
        #[arg(value_name = "TOOL", last = true, required = true)]
        tool: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("ISTRDEFS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// 2 for configuration errors, 1 for every other failure
fn exit_code(err: &anyhow::Error) -> u8 {
    let is_config = err
        .downcast_ref::<Error>()
        .map(Error::is_config)
        .unwrap_or(false);
    if is_config {
        2
    } else {
        1
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Preprocess { jobs, sections } => cmd_preprocess(jobs, &sections),
        Commands::Split {
            mode,
            input,
            output_dir,
        } => cmd_split(&mode, &input, &output_dir),
        Commands::Aggregate {
            mode,
            artifact_dir,
            output,
            json,
        } => cmd_aggregate(&mode, &artifact_dir, &output, json),
        Commands::Generate {
            merged,
            header,
            tool,
        } => cmd_generate(&merged, &header, &tool),
    }
}

/// Parsed `preprocess` sections
#[derive(Debug)]
struct PreprocessArgs {
    config: PreprocessorConfig,
    selection: SourceSelection,
    output: PathBuf,
}

/// Split the keyword-delimited argument list into sections
fn parse_sections(args: &[String], jobs: Option<usize>) -> istrdefs_core::Result<PreprocessArgs> {
    let mut current: Option<&str> = None;
    let mut values: Vec<(&str, Vec<String>)> = SECTIONS.iter().map(|s| (*s, Vec::new())).collect();

    for arg in args {
        if let Some(section) = SECTIONS.iter().copied().find(|s| *s == arg.as_str()) {
            current = Some(section);
            continue;
        }
        let section = current.ok_or_else(|| {
            Error::Config(format!("unexpected argument {} before any section", arg))
        })?;
        if let Some((_, list)) = values.iter_mut().find(|(name, _)| *name == section) {
            list.push(arg.clone());
        }
    }

    let mut take = |name: &str| -> Vec<String> {
        values
            .iter_mut()
            .find(|(section, _)| *section == name)
            .map(|(_, list)| std::mem::take(list))
            .unwrap_or_default()
    };

    let command = take("pp");
    let mut output = take("output");
    if command.is_empty() || output.len() != 1 {
        return Err(Error::Config(
            "usage: preprocess pp <preprocessor> output <output_file> cflags <flags> sources <sources>"
                .into(),
        ));
    }

    let paths = |list: Vec<String>| list.into_iter().map(PathBuf::from).collect::<Vec<_>>();
    let config = PreprocessorConfig {
        command,
        cflags: take("cflags"),
        cxxflags: take("cxxflags"),
        jobs,
    };
    let selection = SourceSelection {
        sources: paths(take("sources")),
        changed: paths(take("changed_sources")),
        dependencies: paths(take("dependencies")),
    };

    Ok(PreprocessArgs {
        config,
        selection,
        output: PathBuf::from(output.remove(0)),
    })
}

fn cmd_preprocess(jobs: Option<usize>, sections: &[String]) -> Result<()> {
    let args = parse_sections(sections, jobs)?;
    let summary = preprocess(&args.config, &args.selection, &args.output)?;
    tracing::info!(
        "Preprocessed {} C and {} C++ files into {}",
        summary.c_files,
        summary.cxx_files,
        args.output.display()
    );
    Ok(())
}

fn cmd_split(mode: &str, input: &Path, output_dir: &Path) -> Result<()> {
    let mode: Mode = mode.parse()?;
    split(mode, input, output_dir)
        .with_context(|| format!("splitting {}", input.display()))?;
    Ok(())
}

fn cmd_aggregate(mode: &str, artifact_dir: &Path, output: &Path, json: bool) -> Result<()> {
    let mode: Mode = mode.parse()?;
    let report = aggregate(mode, artifact_dir, output)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", mode.display_name(), report.status);
    }
    Ok(())
}

fn cmd_generate(merged: &Path, header: &Path, tool: &[String]) -> Result<()> {
    let written = generate_header(tool, merged, header).map_err(Error::from)?;
    if written {
        println!("Generated header at {}", header.display());
    } else {
        println!("Header {} unchanged", header.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_sections() {
        let parsed = parse_sections(
            &args(&[
                "pp", "gcc", "-E", "-dD", "output", "build/pp.i", "cflags", "-DNO_ISTR", "-I.",
                "sources", "a.c", "b.cpp", "changed_sources", "b.cpp",
            ]),
            Some(4),
        )
        .unwrap();

        assert_eq!(parsed.config.command, args(&["gcc", "-E", "-dD"]));
        assert_eq!(parsed.config.cflags, args(&["-DNO_ISTR", "-I."]));
        assert!(parsed.config.cxxflags.is_empty());
        assert_eq!(parsed.config.jobs, Some(4));
        assert_eq!(parsed.output, PathBuf::from("build/pp.i"));
        assert_eq!(parsed.selection.sources.len(), 2);
        assert_eq!(parsed.selection.changed, vec![PathBuf::from("b.cpp")]);
        assert!(parsed.selection.dependencies.is_empty());
    }

    #[test]
    fn test_parse_sections_requires_pp_and_output() {
        let err = parse_sections(&args(&["output", "x.i"]), None).unwrap_err();
        assert!(err.is_config());

        let err = parse_sections(&args(&["pp", "gcc", "output", "a.i", "b.i"]), None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_parse_sections_rejects_leading_values() {
        let err = parse_sections(&args(&["gcc", "pp", "cc", "output", "x.i"]), None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_exit_code_config() {
        let err = anyhow::Error::from(Error::Config("unknown mode bogus".into()));
        assert_eq!(exit_code(&err), 2);

        let err = cmd_split("bogus", Path::new("pp.i"), Path::new("split")).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_exit_code_config_with_context() {
        let err = anyhow::Error::from(Error::Config("preprocessor command is empty".into()))
            .context("splitting pp.i");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_exit_code_other_failures() {
        let err = anyhow::Error::from(Error::Preprocess("gcc failed".into()));
        assert_eq!(exit_code(&err), 1);

        let err = anyhow::Error::from(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        )))
        .context("splitting pp.i");
        assert_eq!(exit_code(&err), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("unexpected")), 1);
    }

    #[test]
    fn test_io_error_chain_printed_once() {
        let err = anyhow::Error::from(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        )))
        .context("splitting pp.i");
        let rendered = format!("{:#}", err);
        assert_eq!(rendered, "splitting pp.i: IO error: No such file or directory");
    }

    #[test]
    fn test_cli_aliases() {
        let cli = Cli::try_parse_from(["istrdefs", "cat", "istr", "split", "out.h"]).unwrap();
        assert!(matches!(cli.command, Commands::Aggregate { json: false, .. }));

        let cli = Cli::try_parse_from([
            "istrdefs", "pp", "pp", "gcc", "-E", "output", "pp.i", "sources", "a.c",
        ])
        .unwrap();
        match cli.command {
            Commands::Preprocess { jobs, sections } => {
                assert_eq!(jobs, None);
                assert_eq!(sections[..3], args(&["pp", "gcc", "-E"])[..]);
            }
            _ => panic!("expected preprocess"),
        }
    }

    #[test]
    fn test_cli_generate_tool() {
        let cli = Cli::try_parse_from([
            "istrdefs", "generate", "merged.h", "out.h", "--", "python3", "makedata.py",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { tool, .. } => assert_eq!(tool, args(&["python3", "makedata.py"])),
            _ => panic!("expected generate"),
        }
    }
}
