//! Writing a complete CASPT2 batch to disk.
//!
//! [`generate`] is the single entry point: it validates the [`JobConfig`],
//! creates the output directory, writes one input file per root and finally the
//! job-array script. Existing files with the same names are overwritten.
//!
//! ```no_run
//! use casjobs::config::{JobConfig, Scheduler, Theory};
//! use casjobs::generator::generate;
//! use casjobs::settings::Settings;
//! use std::path::PathBuf;
//!
//! let config = JobConfig {
//!     base_name: "mol".to_string(),
//!     theory: Theory::Caspt2,
//!     roots: 3,
//!     output_dir: PathBuf::from("jobs"),
//!     multiplicity: None,
//!     user: "alice".to_string(),
//!     scheduler: Scheduler::Sge,
//! };
//! let report = generate(&config, &Settings::default())?;
//! assert_eq!(report.inputs.len(), 3);
//! # Ok::<(), casjobs::generator::GenerateError>(())
//! ```

use crate::config::{ConfigError, JobConfig};
use crate::naming::FileNaming;
use crate::scheduler::render_script;
use crate::settings::Settings;
use crate::template_generator::{render_input, TemplateContext};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while generating a batch.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The job configuration failed validation; nothing was written
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Creating the output directory or writing a file failed
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for generation
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Paths written by one [`generate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Input files, ordered by root index starting at 1
    pub inputs: Vec<PathBuf>,
    /// Job-array script
    pub script: PathBuf,
}

/// Generates all input files and the job-array script for `config`.
///
/// # Errors
///
/// Returns [`GenerateError::Config`] before touching the file system if the
/// configuration is invalid, and [`GenerateError::Io`] if a write fails.
pub fn generate(config: &JobConfig, settings: &Settings) -> Result<GenerationReport> {
    config.validate()?;

    let naming = FileNaming::new(
        &config.base_name,
        config.theory,
        config.multiplicity.as_deref(),
    );

    fs::create_dir_all(&config.output_dir).map_err(|source| GenerateError::Io {
        path: config.output_dir.clone(),
        source,
    })?;
    debug!("Output directory ready: {}", config.output_dir.display());

    let inputs = write_inputs(config, &naming, settings)?;

    let script = config.output_dir.join(naming.job_array_script());
    let content = render_script(config.scheduler, &naming, config.roots, settings);
    write_file(&script, &content)?;
    info!(
        "{} job array script created: {}",
        config.scheduler.as_str().to_uppercase(),
        script.display()
    );

    Ok(GenerationReport { inputs, script })
}

/// Writes one input file per root in `1..=config.roots`.
pub fn write_inputs(
    config: &JobConfig,
    naming: &FileNaming,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for root in 1..=config.roots {
        let ctx = TemplateContext {
            user: &config.user,
            base_name: &config.base_name,
            root,
            scratch_root: &settings.general.scratch_root,
        };
        let path = config.output_dir.join(naming.input_file(root));
        write_file(&path, &render_input(config.theory, &ctx))?;
        info!("Created file: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}
