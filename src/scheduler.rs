//! Job-array scripts for SGE and SLURM.
//!
//! One script is written per batch. Each array task runs `pymolcas` on the
//! input file whose root index equals the scheduler's task index, so the
//! array range is always `1-N` for `N` roots.
//!
//! The script body only exports the OpenMolcas environment and makes the work
//! directory; submission and monitoring are left to the scheduler.

use crate::config::Scheduler;
use crate::naming::FileNaming;
use crate::settings::{MolcasSettings, Settings};

/// Renders the job-array script for `roots` array tasks.
///
/// # Examples
///
/// ```
/// use casjobs::config::{Scheduler, Theory};
/// use casjobs::naming::FileNaming;
/// use casjobs::scheduler::render_script;
/// use casjobs::settings::Settings;
///
/// let naming = FileNaming::new("mol", Theory::Caspt2, None);
/// let script = render_script(Scheduler::Slurm, &naming, 3, &Settings::default());
/// assert!(script.contains("#SBATCH --array=1-3\n"));
/// ```
pub fn render_script(
    scheduler: Scheduler,
    naming: &FileNaming,
    roots: u32,
    settings: &Settings,
) -> String {
    match scheduler {
        Scheduler::Sge => render_sge(naming, roots, settings),
        Scheduler::Slurm => render_slurm(naming, roots, settings),
    }
}

fn render_sge(naming: &FileNaming, roots: u32, settings: &Settings) -> String {
    let sge = &settings.sge;
    let mut script = String::new();
    script.push_str("#!/bin/bash --login\n");
    script.push_str("#$ -cwd\n");
    script.push_str("#$ -V\n");
    script.push_str(&format!("#$ -N {}\n", naming.job_name()));
    script.push_str(&format!("#$ -t 1-{}\n", roots));
    script.push_str(&format!("#$ -pe {} {}\n", sge.parallel_env, sge.slots));
    script.push('\n');
    script.push_str("### Set up environment\n");
    script.push_str(&format!("module load {}\n", sge.module));
    script.push_str("export OMP_NUM_THREADS=$NSLOTS\n");

    push_task_body(&mut script, Scheduler::Sge, naming, &settings.molcas);
    script.push_str("mkdir -p $WorkDir\n");
    script
}

fn render_slurm(naming: &FileNaming, roots: u32, settings: &Settings) -> String {
    let slurm = &settings.slurm;
    let mut script = String::new();
    script.push_str("#!/bin/bash --login\n");
    script.push_str(&format!("#SBATCH -J {}\n", naming.job_name()));
    script.push_str(&format!("#SBATCH -p {}\n", slurm.partition));
    script.push_str(&format!("#SBATCH -n {}\n", slurm.ntasks));
    script.push_str(&format!("#SBATCH -t {}\n", slurm.time));
    script.push_str(&format!("#SBATCH --array=1-{}\n", roots));
    script.push('\n');
    script.push_str("### Set up environment\n");
    script.push_str(&format!("module load {}\n", slurm.module));
    script.push_str("export OMP_NUM_THREADS=$SLURM_NTASKS\n");

    push_task_body(&mut script, Scheduler::Slurm, naming, &settings.molcas);
    script
}

/// Appends the per-task exports and the pymolcas invocation.
fn push_task_body(
    script: &mut String,
    scheduler: Scheduler,
    naming: &FileNaming,
    molcas: &MolcasSettings,
) {
    let task_var = scheduler.task_id_var();

    script.push_str(&format!("TASK_ID=${}\n", task_var));
    script.push('\n');
    script.push_str(&format!(
        "export MOLCAS_PROJECT={}\n",
        naming.task_project(task_var)
    ));
    script.push_str(&format!("export MOLCAS_MEM={}\n", molcas.mem));
    script.push_str(&format!("export MOLCAS_DISK={}\n", molcas.disk));
    script.push_str(&format!("export MOLCAS_PRINT={}\n", molcas.print));
    script.push_str("export MOLCAS_MOLDEN=ON\n");
    script.push_str("export CurrDir=$(pwd -P)\n");
    script.push_str(&format!(
        "export WorkDir={}/$USER/$MOLCAS_PROJECT\n",
        molcas.workdir_root.trim_end_matches('/')
    ));
    script.push('\n');
    script.push_str("### Main body\n");
    script.push_str("mkdir -p $WorkDir\n");
    script.push('\n');
    script.push_str(&format!(
        "pymolcas {} 2>> {} 1>> {}\n",
        naming.task_input(task_var),
        naming.task_error(task_var),
        naming.task_output(task_var)
    ));
}
