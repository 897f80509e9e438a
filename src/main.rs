//! Statecheck CLI - validate analysis state files.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use statecheck::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = program_name(&args);
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    init_logging(verbose);

    if args.len() < 2 {
        print_usage(program);
        return ExitCode::FAILURE;
    }

    let outcome = match args[1].as_str() {
        "validate" => validate_command(&args[2..]),
        "eras" => {
            list_eras();
            Ok(true)
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(true)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            Ok(false)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Name to show in usage text; argv may be empty.
fn program_name(args: &[String]) -> &str {
    args.first().map_or("statecheck", String::as_str)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn print_usage(program: &str) {
    println!("Statecheck v{}", statecheck::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  validate <path|glob>...  Validate one or more state files");
    println!("  eras                     List the supported format eras");
    println!("  help                     Show this help message");
    println!();
    println!("Validate options:");
    println!("  --version <X.Y.Z>   Format version of the states (default: {})", SchemaVersion::LATEST);
    println!("  --linked            Input files are linked rather than embedded");
    println!("  --config <file>     Read settings from a TOML file");
    println!("  --json              Print one JSON report per file");
    println!("  -v, --verbose       Enable debug logging");
}

fn list_eras() {
    println!("Supported format eras:");
    for era in SchemaEra::ALL {
        println!(
            "  {} (from {}, block method: {}, multi-matrix: {}, multi-modal: {})",
            era,
            era.floor(),
            yes_no(era.has_block_method()),
            yes_no(era.supports_multi_matrix()),
            yes_no(era.is_multimodal()),
        );
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Options for the `validate` command.
struct ValidateOptions {
    patterns: Vec<String>,
    version: Option<String>,
    linked: bool,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_validate_args(args: &[String]) -> Result<ValidateOptions> {
    let mut options = ValidateOptions {
        patterns: Vec::new(),
        version: None,
        linked: false,
        config: None,
        json: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--version" if i + 1 < args.len() => {
                options.version = Some(args[i + 1].clone());
                i += 2;
            }
            "--config" if i + 1 < args.len() => {
                options.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--linked" => {
                options.linked = true;
                i += 1;
            }
            "--json" => {
                options.json = true;
                i += 1;
            }
            "-v" | "--verbose" => i += 1,
            flag if flag.starts_with('-') => bail!("unknown or incomplete option: {}", flag),
            pattern => {
                options.patterns.push(pattern.to_string());
                i += 1;
            }
        }
    }

    if options.patterns.is_empty() {
        bail!("please specify at least one state file");
    }
    Ok(options)
}

/// Expand glob patterns, keeping plain paths that match nothing so that
/// the missing file is reported.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern)
            .map_err(StateError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("failed to expand '{}'", pattern))?;
        if matches.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            paths.extend(matches);
        }
    }
    Ok(paths)
}

/// Outcome of validating one file.
struct FileOutcome {
    path: PathBuf,
    report: StateResult<ValidationReport>,
}

fn validate_file(path: PathBuf, pipeline: &ValidationPipeline, version: SchemaVersion) -> FileOutcome {
    let report = load_state(&path).map(|state| pipeline.validate(&state, version));
    FileOutcome { path, report }
}

fn validate_command(args: &[String]) -> Result<bool> {
    let options = parse_validate_args(args)?;

    let mut config = match &options.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    if let Some(version) = &options.version {
        config.version = Some(statecheck::config::VersionSpec::Text(version.clone()));
    }
    if options.linked {
        config.embedded = false;
    }

    let version = config.schema_version()?;
    let pipeline = ValidationPipeline::from_config(&config)?;
    let paths = expand_patterns(&options.patterns)?;
    log::debug!(
        "validating {} file(s) against {} with stages {:?}",
        paths.len(),
        version,
        pipeline.stage_names()
    );

    let outcomes: Vec<FileOutcome> = if config.parallel {
        paths
            .into_par_iter()
            .map(|path| validate_file(path, &pipeline, version))
            .collect()
    } else {
        paths
            .into_iter()
            .map(|path| validate_file(path, &pipeline, version))
            .collect()
    };

    let mut all_valid = true;
    for outcome in &outcomes {
        match &outcome.report {
            Ok(report) => {
                all_valid &= report.success;
                if options.json {
                    println!("{}", serde_json::to_string(report)?);
                } else {
                    print_report(&outcome.path, report);
                }
            }
            Err(err) => {
                all_valid = false;
                eprintln!("✗ {}: {}", outcome.path.display(), err);
            }
        }
    }
    Ok(all_valid)
}

fn print_report(path: &std::path::Path, report: &ValidationReport) {
    println!("{}: {}", path.display(), report.summary_line());
    if let Some(err) = &report.error {
        for line in err.to_string().lines() {
            println!("    {}", line);
        }
        return;
    }
    if let Some(details) = &report.summary.details {
        println!(
            "    {} cells, {} sample(s), modalities {:?}",
            details.num_cells, details.num_samples, details.modalities
        );
    }
    if let Some(retained) = report.summary.retained_cells {
        println!("    {} cells retained after quality control", retained);
    }
    if let Some(pca) = &report.summary.pca {
        println!("    {} PCs", pca.num_pcs);
    }
    if let Some(embeddings) = &report.summary.embeddings {
        if embeddings.combined && embeddings.total_dims.is_none() {
            println!("    'combined' columns checked against a lower bound (dimensions of non-RNA modalities are unknown)");
        }
    }
    if let Some(selections) = &report.summary.selections {
        println!("    {} custom selection(s)", selections.selections.len());
    }
    println!("    checked in {} ms", report.duration_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_program_name_without_argv() {
        assert_eq!(program_name(&[]), "statecheck");
        assert_eq!(program_name(&strings(&["/usr/bin/sc", "validate"])), "/usr/bin/sc");
    }

    #[test]
    fn test_parse_validate_args() {
        let options = parse_validate_args(&strings(&["a.json", "--linked", "--version", "1.2.0", "b.json"])).unwrap();
        assert_eq!(options.patterns, vec!["a.json", "b.json"]);
        assert_eq!(options.version.as_deref(), Some("1.2.0"));
        assert!(options.linked);
        assert!(!options.json);

        assert!(parse_validate_args(&strings(&["--json"])).is_err());
        assert!(parse_validate_args(&strings(&["a.json", "--config"])).is_err());
    }
}
