//! Field manifest of the `intensities` (transition dipoles and line lists) project.

use super::FieldKind::{Float, Int, Str};
use super::{FieldSpec, Literal, Schema, SectionSpec};
use crate::domain::ProjectKind;

pub const INIT: &str = "INIT";
pub const GENERATE: &str = "GENERATE";
pub const CREATE: &str = "CREATE";
pub const CALCULATE: &str = "CALCULATE";

const INIT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "root",
        Str,
        &["Root of the DVR3D distribution holding exe/<model>/ and exe/common/."],
        None,
    ),
    FieldSpec::new("model", Str, &["Dipole moment surface model."], None),
    FieldSpec::new(
        "dipole3b",
        Str,
        &["Executables copied into the project."],
        Some(Literal::Str("dipole3b.x")),
    ),
    FieldSpec::new("spectra", Str, &[], Some(Literal::Str("spectra.x"))),
    FieldSpec::new(
        "root_energies",
        Str,
        &["Positions project holding the state directories."],
        None,
    ),
    FieldSpec::new(
        "states",
        Str,
        &["States listing (copied from root_energies when missing)."],
        Some(Literal::Str("states.txt")),
    ),
    FieldSpec::new(
        "dipole3b_template",
        Str,
        &["Input templates."],
        Some(Literal::Str("dipole3b.inp")),
    ),
    FieldSpec::new(
        "spectra_template",
        Str,
        &[],
        Some(Literal::Str("spectra.inp")),
    ),
    FieldSpec::new(
        "parfile",
        Str,
        &["Dipole moment surface parameters, relative to the project root."],
        None,
    ),
    FieldSpec::new(
        "ezero",
        Float,
        &["Zero point energy, cm-1."],
        Some(Literal::Float(0.0)),
    ),
    FieldSpec::new(
        "partfun",
        Float,
        &["Partition function."],
        Some(Literal::Float(3483.8)),
    ),
    FieldSpec::new(
        "project",
        Str,
        &["Prefix of the transition identifiers."],
        Some(Literal::Str("spe")),
    ),
    FieldSpec::new(
        "profile",
        Str,
        &["Defaults table for the input templates: lite or heavy."],
        Some(Literal::Str("lite")),
    ),
];

const GENERATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "output",
        Str,
        &["Transitions listing."],
        Some(Literal::Str("transitions.txt")),
    ),
    FieldSpec::new(
        "filter",
        Str,
        &[
            "Selection rule over jrot, kmin, ipar, fort, name and the primed",
            "ket values jrot_, kmin_, ipar_, fort_, name_.",
            "Example: ipar != ipar_ and abs(jrot - jrot_) <= 1",
        ],
        Some(Literal::Str("True")),
    ),
    FieldSpec::new(
        "j_min",
        Int,
        &["Range of the bra angular momentum."],
        Some(Literal::Int(0)),
    ),
    FieldSpec::new("j_max", Int, &[], Some(Literal::Int(0))),
    FieldSpec::new(
        "j_diff_min",
        Int,
        &["Range of jrot - jrot_."],
        Some(Literal::Int(-1)),
    ),
    FieldSpec::new("j_diff_max", Int, &[], Some(Literal::Int(1))),
];

const CREATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "transitions",
        Str,
        &["Transitions to prepare."],
        Some(Literal::Str("transitions.txt")),
    ),
    FieldSpec::new(
        "summary",
        Str,
        &["Creation summary."],
        Some(Literal::Str("summary.out")),
    ),
    FieldSpec::new(
        "job_manager",
        Str,
        &["Job manager: Shell or Slurm."],
        Some(Literal::Str("Slurm")),
    ),
];

const CALCULATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "ncores",
        Int,
        &["Number of cores per job."],
        Some(Literal::Int(8)),
    ),
    FieldSpec::new(
        "nnodes",
        Int,
        &["Number of nodes per job."],
        Some(Literal::Int(1)),
    ),
    FieldSpec::new(
        "memory",
        Int,
        &["Memory per job, MB."],
        Some(Literal::Int(8000)),
    ),
    FieldSpec::new(
        "walltime",
        Int,
        &["Job time limit, hours."],
        Some(Literal::Int(24)),
    ),
    FieldSpec::new(
        "partition",
        Str,
        &["Batch partition."],
        Some(Literal::Str("short")),
    ),
];

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: INIT,
        module: "init",
        header: "PATHS, EXECUTABLES AND TEMPLATES",
        fields: INIT_FIELDS,
    },
    SectionSpec {
        name: GENERATE,
        module: "generate",
        header: "SELECTION RULES FOR THE TRANSITIONS",
        fields: GENERATE_FIELDS,
    },
    SectionSpec {
        name: CREATE,
        module: "create",
        header: "CREATE SUBFOLDERS FOR TRANSITIONS",
        fields: CREATE_FIELDS,
    },
    SectionSpec {
        name: CALCULATE,
        module: "calculate",
        header: "MANAGE CALC RESOURCES",
        fields: CALCULATE_FIELDS,
    },
];

pub static INTENSITIES_SCHEMA: Schema = Schema {
    project: ProjectKind::Intensities,
    sections: SECTIONS,
    presets: &[],
};

#[cfg(test)]
mod tests {
    use super::INTENSITIES_SCHEMA;
    use crate::config::{LoadMode, ParameterSet};

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let mut params = ParameterSet::new(&INTENSITIES_SCHEMA);
        params
            .load_str(
                "[INIT]\nroot = /opt/dvr3d\nmodel = dms_666\nparfile =\n[GENERATE]\nj_max = 3\n",
                "intensities.ini",
                LoadMode::IgnoreEmpty,
            )
            .expect("partial config should load");

        assert_eq!(params.str_value("INIT", "root"), Some("/opt/dvr3d"));
        assert_eq!(params.str_value("INIT", "parfile"), None);
        assert_eq!(params.int_value("GENERATE", "j_max"), Some(3));
        assert_eq!(params.str_value("GENERATE", "filter"), Some("True"));
        assert_eq!(params.str_value("CREATE", "job_manager"), Some("Slurm"));
        assert_eq!(params.int_value("CALCULATE", "ncores"), Some(8));
    }
}
