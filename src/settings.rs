//! Site settings for casjobs.
//!
//! Cluster-specific values (scratch layout, modules, resource requests) live in
//! an INI-format settings file so the generator can be moved between machines
//! without code changes. Files are applied in order, later ones overriding
//! earlier ones:
//!
//! 1. Built-in defaults
//! 2. System settings (`/etc/casjobs/casjobs.cfg`)
//! 3. User settings (`~/.config/casjobs/casjobs.cfg`)
//! 4. Local settings (`./casjobs.cfg`)
//!
//! # Settings File Format
//!
//! ```ini
//! [general]
//! scheduler = slurm
//! required_extension = out
//!
//! [slurm]
//! partition = multicore
//! ntasks = 8
//!
//! [molcas]
//! mem = 16000
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use casjobs::settings::SettingsManager;
//!
//! let manager = SettingsManager::load()?;
//! println!("scheduler: {}", manager.settings().general.scheduler);
//! # Ok::<(), casjobs::settings::SettingsError>(())
//! ```

use crate::config::Scheduler;
use crate::template_generator::DEFAULT_SCRATCH_ROOT;
use configparser::ini::Ini;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory and the settings directories.
pub const SETTINGS_FILE_NAME: &str = "casjobs.cfg";

/// Default environment module providing `pymolcas`.
const DEFAULT_MODULE: &str = "apps/gcc/openmolcas/21.02";

/// Errors that can occur while loading or writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error when reading or writing a settings file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// A key holds a value of the wrong type or outside its range
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    /// The settings file in the working directory exists but is unusable
    #[error("Failed to load settings from {}: {source}", .path.display())]
    LocalFile {
        /// Path of the local settings file
        path: PathBuf,
        /// Underlying read or parse error
        #[source]
        source: Box<SettingsError>,
    },
    /// Refusing to overwrite an existing settings file
    #[error("{0} already exists. Please remove it first or choose a different location.")]
    AlreadyExists(String),
}

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

type Section = HashMap<String, Option<String>>;

/// All site settings.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Settings {
    /// Scheduler choice and input naming rules
    pub general: GeneralSettings,
    /// SGE resource requests
    pub sge: SgeSettings,
    /// SLURM resource requests
    pub slurm: SlurmSettings,
    /// OpenMolcas environment exported by the job script
    pub molcas: MolcasSettings,
    /// Console log level
    pub logging: LoggingSettings,
}

/// General generator settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralSettings {
    /// Scheduler used when none is given on the command line (default: sge)
    pub scheduler: Scheduler,
    /// Extension the base file must carry, if any (default: none)
    pub required_extension: Option<String>,
    /// Root of the per-user scratch tree holding the SA-CASSCF files
    pub scratch_root: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            scheduler: Scheduler::Sge,
            required_extension: None,
            scratch_root: DEFAULT_SCRATCH_ROOT.to_string(),
        }
    }
}

/// SGE job-array settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SgeSettings {
    /// Parallel environment name (default: smp.pe)
    pub parallel_env: String,
    /// Slots requested per task (default: 4)
    pub slots: u32,
    /// Module loaded before running pymolcas
    pub module: String,
}

impl Default for SgeSettings {
    fn default() -> Self {
        Self {
            parallel_env: "smp.pe".to_string(),
            slots: 4,
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

/// SLURM job-array settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlurmSettings {
    /// Partition (default: multicore)
    pub partition: String,
    /// Tasks per array element (default: 4)
    pub ntasks: u32,
    /// Wall time in SLURM syntax (default: 2-0)
    pub time: String,
    /// Module loaded before running pymolcas
    pub module: String,
}

impl Default for SlurmSettings {
    fn default() -> Self {
        Self {
            partition: "multicore".to_string(),
            ntasks: 4,
            time: "2-0".to_string(),
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

/// OpenMolcas runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MolcasSettings {
    /// MOLCAS_MEM in MB (default: 12000)
    pub mem: u32,
    /// MOLCAS_DISK in MB (default: 20000)
    pub disk: u32,
    /// MOLCAS_PRINT level (default: 2)
    pub print: u32,
    /// Parent of the per-task work directory, `{workdir_root}/$USER/$MOLCAS_PROJECT`
    pub workdir_root: String,
}

impl Default for MolcasSettings {
    fn default() -> Self {
        Self {
            mem: 12000,
            disk: 20000,
            print: 2,
            workdir_root: "/scratch".to_string(),
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingSettings {
    /// Log level: error, warn, info, debug, trace (default: info)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Renders the settings as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl LoggingSettings {
    /// Parses the configured level, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Loads settings and remembers where they came from.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
}

impl SettingsManager {
    /// Loads settings from the system, user and local settings files.
    ///
    /// Broken system or user files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::LocalFile`] if `./casjobs.cfg` exists but
    /// cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut shared = Vec::new();
        shared.extend(Self::get_system_config_path());
        shared.extend(Self::get_user_config_path());
        Self::load_layers(&shared, Path::new(SETTINGS_FILE_NAME))
    }

    /// Applies the shared settings files, then `local` on top.
    ///
    /// Shared files are handled like [`SettingsManager::load_from`]; a local
    /// file that exists must load cleanly.
    pub fn load_layers(shared: &[PathBuf], local: &Path) -> Result<Self> {
        let mut manager = Self::load_from(shared);
        if local.exists() {
            Self::apply_file(&mut manager.settings, local).map_err(|e| {
                SettingsError::LocalFile {
                    path: local.to_path_buf(),
                    source: Box::new(e),
                }
            })?;
            manager.config_source = local.display().to_string();
            debug!("Applied settings from: {}", local.display());
        }
        info!("Settings loaded from: {}", manager.config_source);
        Ok(manager)
    }

    /// Applies the given settings files in order on top of the defaults.
    ///
    /// Missing files are ignored; unreadable ones are logged and skipped.
    pub fn load_from(paths: &[PathBuf]) -> Self {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();

        for path in paths.iter().filter(|p| p.exists()) {
            let mut candidate = settings.clone();
            match Self::apply_file(&mut candidate, path) {
                Ok(()) => {
                    settings = candidate;
                    config_source = path.display().to_string();
                    debug!("Applied settings from: {}", path.display());
                }
                Err(e) => {
                    warn!("Failed to load settings from {}: {}", path.display(), e);
                }
            }
        }

        Self {
            settings,
            config_source,
        }
    }

    /// Loads a single settings file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        Self::apply_file(&mut settings, path)?;
        Ok(Self {
            settings,
            config_source: path.display().to_string(),
        })
    }

    /// Returns the file the effective settings were last taken from.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Consumes the manager, returning the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    fn apply_file(settings: &mut Settings, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let mut ini = Ini::new();
        ini.read(content)
            .map_err(|e| SettingsError::IniParse(format!("Failed to parse INI: {}", e)))?;
        let map = ini.get_map_ref();

        if let Some(section) = map.get("general") {
            Self::parse_general(&mut settings.general, section)?;
        }
        if let Some(section) = map.get("sge") {
            Self::parse_sge(&mut settings.sge, section)?;
        }
        if let Some(section) = map.get("slurm") {
            Self::parse_slurm(&mut settings.slurm, section)?;
        }
        if let Some(section) = map.get("molcas") {
            Self::parse_molcas(&mut settings.molcas, section)?;
        }
        if let Some(Some(level)) = map.get("logging").and_then(|s| s.get("level")) {
            settings.logging.level = level.clone();
        }
        Ok(())
    }

    fn parse_general(general: &mut GeneralSettings, section: &Section) -> Result<()> {
        if let Some(Some(scheduler)) = section.get("scheduler") {
            general.scheduler = scheduler
                .parse()
                .map_err(|e| SettingsError::InvalidValue(format!("{}", e)))?;
        }
        if let Some(value) = section.get("required_extension") {
            general.required_extension = value
                .as_deref()
                .map(|s| s.trim().trim_start_matches('.'))
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
        if let Some(Some(scratch_root)) = section.get("scratch_root") {
            general.scratch_root = scratch_root.clone();
        }
        Ok(())
    }

    fn parse_sge(sge: &mut SgeSettings, section: &Section) -> Result<()> {
        if let Some(Some(parallel_env)) = section.get("parallel_env") {
            sge.parallel_env = parallel_env.clone();
        }
        if let Some(Some(slots)) = section.get("slots") {
            sge.slots = parse_positive("slots", slots)?;
        }
        if let Some(Some(module)) = section.get("module") {
            sge.module = module.clone();
        }
        Ok(())
    }

    fn parse_slurm(slurm: &mut SlurmSettings, section: &Section) -> Result<()> {
        if let Some(Some(partition)) = section.get("partition") {
            slurm.partition = partition.clone();
        }
        if let Some(Some(ntasks)) = section.get("ntasks") {
            slurm.ntasks = parse_positive("ntasks", ntasks)?;
        }
        if let Some(Some(time)) = section.get("time") {
            slurm.time = time.clone();
        }
        if let Some(Some(module)) = section.get("module") {
            slurm.module = module.clone();
        }
        Ok(())
    }

    fn parse_molcas(molcas: &mut MolcasSettings, section: &Section) -> Result<()> {
        if let Some(Some(mem)) = section.get("mem") {
            molcas.mem = parse_positive("mem", mem)?;
        }
        if let Some(Some(disk)) = section.get("disk") {
            molcas.disk = parse_positive("disk", disk)?;
        }
        if let Some(Some(print)) = section.get("print") {
            molcas.print = print
                .parse()
                .map_err(|_| SettingsError::InvalidValue(format!("Invalid print: {}", print)))?;
        }
        if let Some(Some(workdir_root)) = section.get("workdir_root") {
            molcas.workdir_root = workdir_root.clone();
        }
        Ok(())
    }

    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/casjobs").join(SETTINGS_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("casjobs").join(SETTINGS_FILE_NAME))
        }
    }

    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("casjobs")
                    .join(SETTINGS_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("casjobs").join(SETTINGS_FILE_NAME))
        }
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SettingsError::InvalidValue(format!(
            "Invalid {}: {}",
            key, value
        ))),
    }
}

impl SettingsManager {
    /// Writes a commented settings file holding the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::AlreadyExists`] if `path` exists, so a tuned
    /// settings file is never clobbered.
    pub fn create_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(SettingsError::AlreadyExists(path.display().to_string()));
        }
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    /// Generates the content of a settings template file.
    pub fn generate_template_content() -> String {
        let defaults = Settings::default();
        format!(
            r#"# casjobs settings
#
# Files are applied in this order, later ones overriding earlier ones:
#
# 1. Built-in defaults
# 2. /etc/casjobs/casjobs.cfg
# 3. ~/.config/casjobs/casjobs.cfg
# 4. ./casjobs.cfg
#
# Missing sections or keys keep the values shown below.

[general]
# Scheduler used when --scheduler is not given: sge or slurm
scheduler = {scheduler}

# Extension the SA-CASSCF file must carry, e.g. out. Leave empty to accept any.
required_extension = {required_extension}

# Inputs copy files from <scratch_root>/<user>/scratch/<base>/
scratch_root = {scratch_root}

[sge]
parallel_env = {parallel_env}
slots = {slots}
module = {sge_module}

[slurm]
partition = {partition}
ntasks = {ntasks}
# Wall time, SLURM syntax (days-hours, hh:mm:ss, ...)
time = {time}
module = {slurm_module}

[molcas]
# MOLCAS_MEM and MOLCAS_DISK in MB
mem = {mem}
disk = {disk}
print = {print}
# Work directories are created as <workdir_root>/$USER/$MOLCAS_PROJECT
workdir_root = {workdir_root}

[logging]
# error, warn, info, debug or trace. RUST_LOG takes precedence.
level = {level}
"#,
            scheduler = defaults.general.scheduler,
            required_extension = defaults.general.required_extension.clone().unwrap_or_default(),
            scratch_root = defaults.general.scratch_root,
            parallel_env = defaults.sge.parallel_env,
            slots = defaults.sge.slots,
            sge_module = defaults.sge.module,
            partition = defaults.slurm.partition,
            ntasks = defaults.slurm.ntasks,
            time = defaults.slurm.time,
            slurm_module = defaults.slurm.module,
            mem = defaults.molcas.mem,
            disk = defaults.molcas.disk,
            print = defaults.molcas.print,
            workdir_root = defaults.molcas.workdir_root,
            level = defaults.logging.level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.general.scheduler, Scheduler::Sge);
        assert_eq!(settings.general.required_extension, None);
        assert_eq!(settings.sge.slots, 4);
        assert_eq!(settings.sge.parallel_env, "smp.pe");
        assert_eq!(settings.molcas.mem, 12000);
        assert_eq!(settings.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_from_file_overrides_only_given_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "a.cfg",
            "[general]\nscheduler = slurm\nrequired_extension = .out\n\n[slurm]\nntasks = 8\n",
        );
        let settings = SettingsManager::from_file(&path).unwrap().into_settings();
        assert_eq!(settings.general.scheduler, Scheduler::Slurm);
        assert_eq!(settings.general.required_extension.as_deref(), Some("out"));
        assert_eq!(settings.slurm.ntasks, 8);
        assert_eq!(settings.slurm.partition, "multicore");
        assert_eq!(settings.sge, SgeSettings::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.cfg", "[sge]\nslots = 0\n");
        assert!(matches!(
            SettingsManager::from_file(&path),
            Err(SettingsError::InvalidValue(_))
        ));

        let path = write(&dir, "bad2.cfg", "[general]\nscheduler = pbs\n");
        assert!(SettingsManager::from_file(&path).is_err());
    }

    #[test]
    fn test_later_files_take_precedence() {
        let dir = TempDir::new().unwrap();
        let system = write(&dir, "system.cfg", "[molcas]\nmem = 8000\ndisk = 9000\n");
        let local = write(&dir, "local.cfg", "[molcas]\nmem = 16000\n");
        let missing = dir.path().join("missing.cfg");

        let manager = SettingsManager::load_from(&[system, missing, local.clone()]);
        assert_eq!(manager.settings().molcas.mem, 16000);
        assert_eq!(manager.settings().molcas.disk, 9000);
        assert_eq!(manager.config_source(), local.display().to_string());
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.cfg", "[sge]\nslots = 8\n");
        let bad = write(&dir, "bad.cfg", "[sge]\nslots = many\n");

        let manager = SettingsManager::load_from(&[good.clone(), bad]);
        assert_eq!(manager.settings().sge.slots, 8);
        assert_eq!(manager.config_source(), good.display().to_string());
    }

    #[test]
    fn test_broken_local_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let shared = write(&dir, "shared.cfg", "[sge]\nslots = many\n");
        let local = write(&dir, "local.cfg", "[molcas]\nmem = lots\n");

        let err = SettingsManager::load_layers(&[shared], &local).unwrap_err();
        match err {
            SettingsError::LocalFile { path, source } => {
                assert_eq!(path, local);
                assert!(matches!(*source, SettingsError::InvalidValue(_)));
            }
            other => panic!("Expected a local file error, got {:?}", other),
        }
    }

    #[test]
    fn test_local_file_overrides_shared_files() {
        let dir = TempDir::new().unwrap();
        let shared = write(&dir, "shared.cfg", "[molcas]\nmem = 8000\ndisk = 9000\n");
        let local = write(&dir, "local.cfg", "[molcas]\nmem = 16000\n");

        let manager = SettingsManager::load_layers(&[shared], &local).unwrap();
        assert_eq!(manager.settings().molcas.mem, 16000);
        assert_eq!(manager.settings().molcas.disk, 9000);
        assert_eq!(manager.config_source(), local.display().to_string());

        let absent = dir.path().join("absent.cfg");
        let manager = SettingsManager::load_layers(&[], &absent).unwrap();
        assert_eq!(manager.config_source(), "built-in defaults");
    }

    #[test]
    fn test_settings_as_json() {
        let json = Settings::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["general"]["scheduler"], "sge");
        assert_eq!(value["general"]["required_extension"], serde_json::Value::Null);
        assert_eq!(value["sge"]["slots"], 4);
        assert_eq!(value["molcas"]["workdir_root"], "/scratch");
    }

    #[test]
    fn test_template_loads_back_as_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        SettingsManager::create_template(&path).unwrap();

        let settings = SettingsManager::from_file(&path).unwrap().into_settings();
        assert_eq!(settings, Settings::default());

        assert!(matches!(
            SettingsManager::create_template(&path),
            Err(SettingsError::AlreadyExists(_))
        ));
    }
}
