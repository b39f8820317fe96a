//! casjobs Command-Line Interface
//!
//! Generates one OpenMolcas CASPT2 input per root plus a job-array script
//! that runs them on an SGE or SLURM cluster.
//!
//! # Examples
//!
//! ```bash
//! # Three single-state CASPT2 inputs and an SGE script in the current directory
//! casjobs mol.out --roots 3 --theory caspt2
//!
//! # XMS-CASPT2 for the triplet manifold, SLURM script, separate directory
//! casjobs mol.out -r 5 -t xms-caspt2 -m triplet -s slurm -o triplets
//!
//! # Write a commented settings file to ./casjobs.cfg
//! casjobs --init-settings
//!
//! # Print the effective settings as JSON
//! casjobs --show-settings
//! ```
//!
//! The invoking user is read from `USER`; the run aborts before writing
//! anything if it is not set.

use casjobs::config::{derive_base_name, resolve_user, JobConfig, Scheduler, Theory};
use casjobs::generator::{generate, GenerationReport};
use casjobs::settings::{Settings, SettingsManager, SETTINGS_FILE_NAME};
use clap::Parser;
use log::{debug, info};
use std::env;
use std::path::{Path, PathBuf};
use std::process;

/// Generate multiple CASPT2 input files and a scheduler job-array script
#[derive(Parser, Debug)]
#[command(name = "casjobs", version, about, long_about = None)]
struct Args {
    /// Previously run SA-CASSCF output file; its stem names all generated files
    #[arg(required_unless_present_any = ["init_settings", "show_settings"])]
    basename: Option<PathBuf>,

    /// Number of roots to generate inputs for
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        required_unless_present_any = ["init_settings", "show_settings"]
    )]
    roots: Option<u32>,

    /// CASPT2 variant
    #[arg(
        short,
        long,
        value_enum,
        required_unless_present_any = ["init_settings", "show_settings"]
    )]
    theory: Option<Theory>,

    /// Output directory, created if missing
    #[arg(short, long, visible_alias = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// Multiplicity label added to every file name (e.g. singlet, triplet)
    #[arg(short = 'm', long = "mult")]
    multiplicity: Option<String>,

    /// Batch scheduler; defaults to the settings file value
    #[arg(short, long, value_enum)]
    scheduler: Option<Scheduler>,

    /// Write a settings template to ./casjobs.cfg and exit
    #[arg(long, conflicts_with_all = ["basename", "roots", "theory", "multiplicity"])]
    init_settings: bool,

    /// Print the effective settings as JSON and exit
    #[arg(
        long,
        conflicts_with_all = ["basename", "roots", "theory", "multiplicity", "init_settings"]
    )]
    show_settings: bool,
}

fn main() {
    // Everything passes the filter; the global max level decides what is shown
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();
    let rust_log_set = env::var_os("RUST_LOG").is_some();
    if !rust_log_set {
        log::set_max_level(log::LevelFilter::Info);
    }

    let args = Args::parse();

    if args.init_settings {
        match SettingsManager::create_template(Path::new(SETTINGS_FILE_NAME)) {
            Ok(()) => {
                println!("✓ Settings template created successfully!");
                println!("  Output file: {}", SETTINGS_FILE_NAME);
            }
            Err(e) => {
                eprintln!("Error creating settings template: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if args.show_settings {
        match show_settings(rust_log_set) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    match run(&args, rust_log_set) {
        Ok(report) => print_summary(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Loads the settings files and applies the configured log level.
fn load_settings(rust_log_set: bool) -> Result<Settings, Box<dyn std::error::Error>> {
    let manager = SettingsManager::load()?;
    if !rust_log_set {
        log::set_max_level(manager.settings().logging.level_filter());
    }
    Ok(manager.into_settings())
}

fn show_settings(rust_log_set: bool) -> Result<String, Box<dyn std::error::Error>> {
    Ok(load_settings(rust_log_set)?.to_json()?)
}

/// Resolves the job configuration and writes the batch.
fn run(args: &Args, rust_log_set: bool) -> Result<GenerationReport, Box<dyn std::error::Error>> {
    let settings = load_settings(rust_log_set)?;
    debug!("Effective settings: {}", settings.to_json()?);

    let user = resolve_user(|key| env::var(key).ok())?;

    let (basename, roots, theory) = match (&args.basename, args.roots, args.theory) {
        (Some(basename), Some(roots), Some(theory)) => (basename, roots, theory),
        _ => return Err("basename, --roots and --theory are required".into()),
    };
    let base_name = derive_base_name(basename, settings.general.required_extension.as_deref())?;

    let config = JobConfig {
        base_name,
        theory,
        roots,
        output_dir: args.output_dir.clone(),
        multiplicity: args.multiplicity.clone(),
        user,
        scheduler: args.scheduler.unwrap_or(settings.general.scheduler),
    };
    info!(
        "Generating {} {} input(s) for {} ({} script)",
        config.roots, config.theory, config.base_name, config.scheduler
    );

    Ok(generate(&config, &settings)?)
}

fn print_summary(report: &GenerationReport) {
    println!("✓ {} input file(s) created", report.inputs.len());
    println!("  Job array script: {}", report.script.display());
    println!("\nNext steps:");
    println!("  1. Check the >>COPY paths point at your SA-CASSCF scratch files");
    println!("  2. Submit the script from the output directory");
}
