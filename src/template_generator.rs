use crate::config::Theory;

/// Default root of the per-user scratch tree the SA-CASSCF files live in.
pub const DEFAULT_SCRATCH_ROOT: &str = "/mnt/iusers01/chem01";

/// SA-CASSCF files copied into each CASPT2 job, as `(extension, target)`.
///
/// A target starting with `$Project` keeps the extension; `INPORB` is the
/// orbital file slot.
const COPIED_FILES: [(&str, &str); 11] = [
    ("OneRel", "$Project.OneRel"),
    ("RasOrb", "INPORB"),
    ("RunFile", "$Project.RunFile"),
    ("OneInt", "$Project.OneInt"),
    ("ChDiag", "$Project.ChDiag"),
    ("ChMap", "$Project.ChMap"),
    ("ChRed", "$Project.ChRed"),
    ("ChRst", "$Project.ChRst"),
    ("ChVec1", "$Project.ChVec1"),
    ("NqGrid", "$Project.NqGrid"),
    ("JobIph", "$Project.JobIph"),
];

/// Values interpolated into an input template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext<'a> {
    /// Invoking user
    pub user: &'a str,
    /// Base name of the SA-CASSCF job
    pub base_name: &'a str,
    /// Root the calculation is restricted to (`Only=`)
    pub root: u32,
    /// Scratch tree root, `{scratch_root}/{user}/scratch/{base}/`
    pub scratch_root: &'a str,
}

/// Returns the `&CASPT2` keywords selecting the multi-state treatment.
fn multistate_keywords(theory: Theory) -> &'static str {
    match theory {
        Theory::Caspt2 => "Multi=all\nNoMult\n",
        Theory::MsCaspt2 => "Multi=all\n",
        Theory::XmsCaspt2 => "XMulti=all\n",
    }
}

/// Renders the OpenMolcas CASPT2 input for one root.
///
/// # Examples
///
/// ```
/// use casjobs::config::Theory;
/// use casjobs::template_generator::{render_input, TemplateContext, DEFAULT_SCRATCH_ROOT};
///
/// let ctx = TemplateContext {
///     user: "alice",
///     base_name: "mol",
///     root: 2,
///     scratch_root: DEFAULT_SCRATCH_ROOT,
/// };
/// let text = render_input(Theory::XmsCaspt2, &ctx);
/// assert!(text.contains("XMulti=all\nIMAG=0.2\nOnly=2\n"));
/// ```
pub fn render_input(theory: Theory, ctx: &TemplateContext<'_>) -> String {
    let source_dir = format!(
        "{}/{}/scratch/{}",
        ctx.scratch_root.trim_end_matches('/'),
        ctx.user,
        ctx.base_name
    );

    let mut content = String::new();
    for (ext, target) in COPIED_FILES {
        content.push_str(&format!(
            ">>COPY {}/{}.{} {}\n",
            source_dir, ctx.base_name, ext, target
        ));
    }

    content.push_str("\n&CASPT2\n");
    content.push_str(multistate_keywords(theory));
    content.push_str(&format!("IMAG=0.2\nOnly={}\nMAXITER=100\n", ctx.root));
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(root: u32) -> TemplateContext<'static> {
        TemplateContext {
            user: "alice",
            base_name: "mol",
            root,
            scratch_root: DEFAULT_SCRATCH_ROOT,
        }
    }

    #[test]
    fn test_caspt2_template_exact() {
        let expected = "\
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.OneRel $Project.OneRel
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.RasOrb INPORB
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.RunFile $Project.RunFile
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.OneInt $Project.OneInt
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.ChDiag $Project.ChDiag
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.ChMap $Project.ChMap
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.ChRed $Project.ChRed
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.ChRst $Project.ChRst
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.ChVec1 $Project.ChVec1
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.NqGrid $Project.NqGrid
>>COPY /mnt/iusers01/chem01/alice/scratch/mol/mol.JobIph $Project.JobIph

&CASPT2
Multi=all
NoMult
IMAG=0.2
Only=1
MAXITER=100
";
        assert_eq!(render_input(Theory::Caspt2, &ctx(1)), expected);
    }

    #[test]
    fn test_multistate_blocks() {
        let ms = render_input(Theory::MsCaspt2, &ctx(4));
        assert!(ms.ends_with("&CASPT2\nMulti=all\nIMAG=0.2\nOnly=4\nMAXITER=100\n"));
        assert!(!ms.contains("NoMult"));

        let xms = render_input(Theory::XmsCaspt2, &ctx(4));
        assert!(xms.ends_with("&CASPT2\nXMulti=all\nIMAG=0.2\nOnly=4\nMAXITER=100\n"));
    }

    #[test]
    fn test_custom_scratch_root() {
        let ctx = TemplateContext {
            scratch_root: "/scratch/",
            ..ctx(1)
        };
        let text = render_input(Theory::Caspt2, &ctx);
        assert!(text.starts_with(">>COPY /scratch/alice/scratch/mol/mol.OneRel $Project.OneRel\n"));
    }
}
