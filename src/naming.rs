//! File naming for generated inputs and job-array scripts
//!
//! Every generated name is built from a common stem, `{base}_{theory}` or
//! `{base}_{theory}_{mult}` when a multiplicity label is given. This keeps
//! batches for different variants and spin states apart in one directory.
//!
//! # Example
//!
//! ```
//! use casjobs::config::Theory;
//! use casjobs::naming::FileNaming;
//!
//! let naming = FileNaming::new("mol", Theory::Caspt2, None);
//! assert_eq!(naming.input_file(2), "mol_caspt2_root_2.inp");
//! assert_eq!(naming.job_array_script(), "mol_caspt2_job_array.sh");
//! assert_eq!(naming.task_input("SGE_TASK_ID"), "mol_caspt2_root_$SGE_TASK_ID.inp");
//! ```

use crate::config::Theory;

/// Builds the names of all files belonging to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    stem: String,
}

impl FileNaming {
    /// Creates the naming scheme for a base name, theory and optional multiplicity.
    pub fn new(base_name: &str, theory: Theory, multiplicity: Option<&str>) -> Self {
        let stem = match multiplicity {
            Some(mult) => format!("{}_{}_{}", base_name, theory.as_str(), mult),
            None => format!("{}_{}", base_name, theory.as_str()),
        };
        Self { stem }
    }

    /// Returns the shared stem, also used as the scheduler job name.
    pub fn job_name(&self) -> &str {
        &self.stem
    }

    /// Returns the input file name for a root
    ///
    /// Format: `{stem}_root_{root}.inp`
    pub fn input_file(&self, root: u32) -> String {
        format!("{}_root_{}.inp", self.stem, root)
    }

    /// Returns the job-array script name
    ///
    /// Format: `{stem}_job_array.sh`
    pub fn job_array_script(&self) -> String {
        format!("{}_job_array.sh", self.stem)
    }

    /// Returns the project name keyed on a scheduler task variable
    ///
    /// Format: `{stem}_root_${var}`
    pub fn task_project(&self, task_var: &str) -> String {
        format!("{}_root_${}", self.stem, task_var)
    }

    /// Returns the input file name keyed on a scheduler task variable
    pub fn task_input(&self, task_var: &str) -> String {
        format!("{}.inp", self.task_project(task_var))
    }

    /// Returns the stdout capture file keyed on a scheduler task variable
    pub fn task_output(&self, task_var: &str) -> String {
        format!("{}.out", self.task_project(task_var))
    }

    /// Returns the stderr capture file keyed on a scheduler task variable
    pub fn task_error(&self, task_var: &str) -> String {
        format!("{}.err", self.task_project(task_var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_names() {
        let naming = FileNaming::new("mol", Theory::Caspt2, None);
        assert_eq!(naming.input_file(1), "mol_caspt2_root_1.inp");
        assert_eq!(naming.input_file(12), "mol_caspt2_root_12.inp");
    }

    #[test]
    fn test_names_with_multiplicity() {
        let naming = FileNaming::new("mol", Theory::XmsCaspt2, Some("triplet"));
        assert_eq!(naming.job_name(), "mol_xms-caspt2_triplet");
        assert_eq!(naming.input_file(3), "mol_xms-caspt2_triplet_root_3.inp");
        assert_eq!(
            naming.job_array_script(),
            "mol_xms-caspt2_triplet_job_array.sh"
        );
    }

    #[test]
    fn test_task_names() {
        let naming = FileNaming::new("mol", Theory::MsCaspt2, None);
        assert_eq!(
            naming.task_project("SLURM_ARRAY_TASK_ID"),
            "mol_ms-caspt2_root_$SLURM_ARRAY_TASK_ID"
        );
        assert_eq!(
            naming.task_output("SGE_TASK_ID"),
            "mol_ms-caspt2_root_$SGE_TASK_ID.out"
        );
        assert_eq!(
            naming.task_error("SGE_TASK_ID"),
            "mol_ms-caspt2_root_$SGE_TASK_ID.err"
        );
    }
}
