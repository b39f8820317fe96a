//! Job configuration for a CASPT2 batch.
//!
//! This module defines the values that drive one generator run:
//!
//! - [`Theory`]: Which CASPT2 variant the input files request
//! - [`Scheduler`]: Which batch system the job-array script targets
//! - [`JobConfig`]: Everything needed to name and render the generated files
//!
//! The base name and the invoking user are resolved here as well, so that every
//! check happens before the first file is written.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the invoking user's name.
pub const USER_ENV_VAR: &str = "USER";

/// Errors raised while resolving or validating a job configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The `USER` environment variable is unset or empty
    #[error("{} environment variable not found", USER_ENV_VAR)]
    MissingUser,
    /// Theory name is not one of the supported CASPT2 variants
    #[error("Unknown theory '{0}'. Supported: caspt2, ms-caspt2, xms-caspt2")]
    UnknownTheory(String),
    /// Scheduler name is not `sge` or `slurm`
    #[error("Unknown scheduler '{0}'. Supported: sge, slurm")]
    UnknownScheduler(String),
    /// Root count below one
    #[error("Number of roots must be at least 1 (got {0})")]
    InvalidRootCount(u32),
    /// Base file does not carry the configured extension
    #[error("Expected a .{expected} file, got '{file}'")]
    UnexpectedExtension {
        /// Extension the settings require
        expected: String,
        /// File name as given on the command line
        file: String,
    },
    /// Base file name has no usable stem
    #[error("Cannot derive a base name from '{0}'")]
    EmptyBaseName(String),
    /// Multiplicity label would break the generated file names
    #[error("Invalid multiplicity label '{0}'")]
    InvalidMultiplicity(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// CASPT2 variant requested in the generated input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Theory {
    /// Single-state CASPT2 (`Multi=all` with `NoMult`)
    #[value(name = "caspt2")]
    Caspt2,
    /// Multi-state CASPT2 (`Multi=all`)
    #[value(name = "ms-caspt2")]
    MsCaspt2,
    /// Extended multi-state CASPT2 (`XMulti=all`)
    #[value(name = "xms-caspt2")]
    XmsCaspt2,
}

impl Theory {
    /// All supported variants, in the order they are listed to users.
    pub const ALL: [Theory; 3] = [Theory::Caspt2, Theory::MsCaspt2, Theory::XmsCaspt2];

    /// Returns the name used on the command line and in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theory::Caspt2 => "caspt2",
            Theory::MsCaspt2 => "ms-caspt2",
            Theory::XmsCaspt2 => "xms-caspt2",
        }
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        Theory::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| ConfigError::UnknownTheory(s.to_string()))
    }
}

/// Batch system the job-array script is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scheduler {
    /// Sun/Son of Grid Engine (`#$` directives, `$SGE_TASK_ID`)
    #[default]
    Sge,
    /// SLURM (`#SBATCH` directives, `$SLURM_ARRAY_TASK_ID`)
    Slurm,
}

impl Scheduler {
    /// Returns the lowercase scheduler name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheduler::Sge => "sge",
            Scheduler::Slurm => "slurm",
        }
    }

    /// Returns the shell variable the scheduler sets to the array task index.
    pub fn task_id_var(&self) -> &'static str {
        match self {
            Scheduler::Sge => "SGE_TASK_ID",
            Scheduler::Slurm => "SLURM_ARRAY_TASK_ID",
        }
    }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheduler {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sge" => Ok(Scheduler::Sge),
            "slurm" => Ok(Scheduler::Slurm),
            _ => Err(ConfigError::UnknownScheduler(s.to_string())),
        }
    }
}

/// Fully resolved parameters of one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Base name of the SA-CASSCF job, extension stripped
    pub base_name: String,
    /// CASPT2 variant
    pub theory: Theory,
    /// Number of roots; one input file is written per root
    pub roots: u32,
    /// Directory receiving all generated files
    pub output_dir: PathBuf,
    /// Optional multiplicity label inserted into file names (e.g. `singlet`)
    pub multiplicity: Option<String>,
    /// Invoking user, interpolated into scratch paths
    pub user: String,
    /// Target batch system
    pub scheduler: Scheduler,
}

impl JobConfig {
    /// Checks the invariants that must hold before anything is written.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRootCount`] if `roots` is zero
    /// - [`ConfigError::EmptyBaseName`] if the base name is blank
    /// - [`ConfigError::MissingUser`] if the user is blank
    /// - [`ConfigError::InvalidMultiplicity`] for empty labels or labels
    ///   containing whitespace or path separators
    pub fn validate(&self) -> Result<()> {
        if self.roots < 1 {
            return Err(ConfigError::InvalidRootCount(self.roots));
        }
        if self.base_name.trim().is_empty() {
            return Err(ConfigError::EmptyBaseName(self.base_name.clone()));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::MissingUser);
        }
        if let Some(mult) = &self.multiplicity {
            let bad_char = |c: char| c.is_whitespace() || c == '/' || c == '\\';
            if mult.is_empty() || mult.chars().any(bad_char) {
                return Err(ConfigError::InvalidMultiplicity(mult.clone()));
            }
        }
        Ok(())
    }
}

/// Derives the job base name from the previously run SA-CASSCF file.
///
/// Directory components and the final extension are dropped, so
/// `runs/mol.out` becomes `mol`. When `required_extension` is set the file
/// must carry that extension (case-insensitive, leading dot optional).
///
/// # Examples
///
/// ```
/// use casjobs::config::derive_base_name;
/// use std::path::Path;
///
/// assert_eq!(derive_base_name(Path::new("mol.out"), None).unwrap(), "mol");
/// assert!(derive_base_name(Path::new("mol.log"), Some("out")).is_err());
/// ```
pub fn derive_base_name(file: &Path, required_extension: Option<&str>) -> Result<String> {
    if let Some(expected) = required_extension {
        let expected = expected.trim_start_matches('.');
        let matches = file
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(expected))
            .unwrap_or(false);
        if !matches {
            return Err(ConfigError::UnexpectedExtension {
                expected: expected.to_string(),
                file: file.display().to_string(),
            });
        }
    }

    file.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::EmptyBaseName(file.display().to_string()))
}

/// Resolves the invoking user through `lookup`.
///
/// `lookup` receives [`USER_ENV_VAR`]; pass `|k| std::env::var(k).ok()` for the
/// process environment.
pub fn resolve_user<F>(lookup: F) -> Result<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    match lookup(USER_ENV_VAR) {
        Some(user) if !user.trim().is_empty() => Ok(user),
        _ => Err(ConfigError::MissingUser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JobConfig {
        JobConfig {
            base_name: "mol".to_string(),
            theory: Theory::Caspt2,
            roots: 3,
            output_dir: PathBuf::from("."),
            multiplicity: None,
            user: "alice".to_string(),
            scheduler: Scheduler::Sge,
        }
    }

    #[test]
    fn test_theory_from_str() {
        assert_eq!("caspt2".parse::<Theory>().unwrap(), Theory::Caspt2);
        assert_eq!("MS-CASPT2".parse::<Theory>().unwrap(), Theory::MsCaspt2);
        assert_eq!("xms-caspt2".parse::<Theory>().unwrap(), Theory::XmsCaspt2);
        assert_eq!(
            "rs2c".parse::<Theory>(),
            Err(ConfigError::UnknownTheory("rs2c".to_string()))
        );
    }

    #[test]
    fn test_theory_names_round_trip_through_display() {
        for theory in Theory::ALL {
            assert_eq!(theory.to_string().parse::<Theory>().unwrap(), theory);
        }
    }

    #[test]
    fn test_scheduler_from_str() {
        assert_eq!("SGE".parse::<Scheduler>().unwrap(), Scheduler::Sge);
        assert_eq!("slurm".parse::<Scheduler>().unwrap(), Scheduler::Slurm);
        assert!("pbs".parse::<Scheduler>().is_err());
        assert_eq!(Scheduler::default(), Scheduler::Sge);
    }

    #[test]
    fn test_derive_base_name() {
        assert_eq!(derive_base_name(Path::new("mol.out"), None).unwrap(), "mol");
        assert_eq!(
            derive_base_name(Path::new("/path/to/mol.out"), Some("out")).unwrap(),
            "mol"
        );
        assert_eq!(
            derive_base_name(Path::new("mol.OUT"), Some(".out")).unwrap(),
            "mol"
        );
        assert_eq!(derive_base_name(Path::new("mol"), None).unwrap(), "mol");
        assert_eq!(
            derive_base_name(Path::new("mol.a.out"), None).unwrap(),
            "mol.a"
        );
    }

    #[test]
    fn test_derive_base_name_rejects_wrong_extension() {
        let err = derive_base_name(Path::new("mol.log"), Some("out")).unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedExtension { .. }));
        assert!(derive_base_name(Path::new("mol"), Some("out")).is_err());
    }

    #[test]
    fn test_resolve_user() {
        assert_eq!(resolve_user(|_| Some("alice".to_string())).unwrap(), "alice");
        assert_eq!(resolve_user(|_| None), Err(ConfigError::MissingUser));
        assert_eq!(
            resolve_user(|_| Some("  ".to_string())),
            Err(ConfigError::MissingUser)
        );
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut config = sample();
        config.roots = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidRootCount(0)));

        let mut config = sample();
        config.multiplicity = Some("trip let".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMultiplicity(_))
        ));

        let mut config = sample();
        config.multiplicity = Some("triplet".to_string());
        assert!(config.validate().is_ok());
    }
}
