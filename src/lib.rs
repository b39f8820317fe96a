#![deny(missing_docs)]

//! casjobs - CASPT2 Job-Array Generator
//!
//! casjobs turns a finished state-averaged CASSCF calculation into a batch of
//! single-root CASPT2 calculations for OpenMolcas, ready to submit as one
//! job array on an SGE or SLURM cluster.
//!
//! # Overview
//!
//! For `N` roots one run writes:
//!
//! - `N` input files, `{base}_{theory}[_{mult}]_root_{k}.inp` for `k` in `1..=N`,
//!   each restricted to its root with `Only=k`
//! - one job-array script, `{base}_{theory}[_{mult}]_job_array.sh`, whose
//!   array range `1-N` maps each task index onto one input file
//!
//! Every input copies the SA-CASSCF files (orbitals, RunFile, JobIph, Cholesky
//! vectors) from the user's scratch tree, so the CASPT2 step starts from the
//! converged reference without recomputing it.
//!
//! # Supported Theories
//!
//! | Theory | `&CASPT2` keywords |
//! |--------|--------------------|
//! | `caspt2` | `Multi=all`, `NoMult` |
//! | `ms-caspt2` | `Multi=all` |
//! | `xms-caspt2` | `XMulti=all` |
//!
//! # Quick Start
//!
//! ```no_run
//! use casjobs::config::{derive_base_name, resolve_user, JobConfig, Scheduler, Theory};
//! use casjobs::generator::generate;
//! use casjobs::settings::SettingsManager;
//! use std::path::{Path, PathBuf};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = SettingsManager::load()?.into_settings();
//!     let config = JobConfig {
//!         base_name: derive_base_name(Path::new("mol.out"), None)?,
//!         theory: Theory::XmsCaspt2,
//!         roots: 3,
//!         output_dir: PathBuf::from("."),
//!         multiplicity: None,
//!         user: resolve_user(|k| std::env::var(k).ok())?,
//!         scheduler: Scheduler::Slurm,
//!     };
//!     let report = generate(&config, &settings)?;
//!     println!("submit {}", report.script.display());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`](config/index.html) - Theories, schedulers and the job configuration
//! - [`naming`](naming/index.html) - Generated file names
//! - [`template_generator`](template_generator/index.html) - OpenMolcas input templates
//! - [`scheduler`](scheduler/index.html) - SGE and SLURM job-array scripts
//! - [`generator`](generator/index.html) - Writing a batch to disk
//! - [`settings`](settings/index.html) - Site settings file

pub mod config;
pub mod generator;
/// Generated file names
pub mod naming;
pub mod scheduler;
/// Site settings management
pub mod settings;
/// OpenMolcas CASPT2 input templates
pub mod template_generator;

pub use config::{JobConfig, Scheduler, Theory};
pub use generator::{generate, GenerationReport};
