//! Field manifest and templates of the `positions` (energy levels) project.

use super::FieldKind::{Bool, Float, Int, Str};
use super::{FieldSpec, Literal, Preset, Schema, SectionSpec};
use crate::domain::ProjectKind;

pub const GENERAL: &str = "GENERAL";
pub const MOLECULE: &str = "MOLECULE";
pub const DVR3DRJZ_INPUT: &str = "DVR3DRJZ_INPUT";
pub const DVR3DRJZ_SOURCE: &str = "DVR3DRJZ_SOURCE";
pub const ROTLEV_SOURCE: &str = "ROTLEV_SOURCE";
pub const PES_SOURCE: &str = "PES_SOURCE";
pub const BUILD: &str = "BUILD";
pub const RESOURCES: &str = "RESOURCES";
pub const GENERATE: &str = "GENERATE";
pub const CREATE: &str = "CREATE";
pub const CALCULATE: &str = "CALCULATE";

/// Default naming template for state directories, e.g. `jki_0120f`.
pub const DEFAULT_STATE_PATTERN: &str = "jki_{jrot:02}{kmin}{ipar}f";

const GENERAL_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    "project",
    Str,
    &["Name of the project."],
    None,
)];

const MOLECULE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "isotope_left",
        Str,
        &["Isotopes forming the molecule (left, center, right)."],
        None,
    ),
    FieldSpec::new("isotope_center", Str, &[], None),
    FieldSpec::new("isotope_right", Str, &[], None),
    FieldSpec::new(
        "isotope_left_mass",
        Float,
        &["Isotopic masses in units of the electron mass (optional)."],
        None,
    ),
    FieldSpec::new("isotope_center_mass", Float, &[], None),
    FieldSpec::new("isotope_right_mass", Float, &[], None),
    FieldSpec::new("ediss", Float, &["Dissociation energy, cm-1."], None),
    FieldSpec::new(
        "ediss_offset",
        Float,
        &["Dissociation energy offset, cm-1."],
        Some(Literal::Float(5000.0)),
    ),
    FieldSpec::new(
        "ezero",
        Float,
        &["Zero point energy, cm-1."],
        Some(Literal::Float(0.0)),
    ),
];

const DVR3DRJZ_INPUT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "atomic_masses",
        Bool,
        &[
            "Mass flag: true -> atomic masses, false -> nuclear masses.",
            "Ignored for isotopes with masses given in [MOLECULE].",
        ],
        Some(Literal::Bool(true)),
    ),
    FieldSpec::new(
        "coordinates",
        Str,
        &["Coordinate system: radau, jacobi or scattering."],
        Some(Literal::Str("radau")),
    ),
    FieldSpec::new(
        "prt",
        Str,
        &["Namelist PRT."],
        Some(Literal::Str(
            "&PRT ztran=.true.,  ztheta=.false., zlin=.true. &END",
        )),
    ),
    FieldSpec::new(
        "var",
        Str,
        &["Namelist VAR (may carry further groups, e.g. &INT)."],
        Some(Literal::Str("&VAR meout=.false.,  &INT toler=0.000001   &END")),
    ),
    FieldSpec::new(
        "ncoord",
        Int,
        &["Number of vibrational coordinates of the problem."],
        Some(Literal::Int(3)),
    ),
    FieldSpec::new(
        "npnt2",
        Int,
        &["Number of DVR points in r2 from Gauss-(associated) Laguerre quadrature."],
        Some(Literal::Int(40)),
    ),
    FieldSpec::new(
        "neval",
        Int,
        &["Number of eigenvalues and eigenvectors required."],
        Some(Literal::Int(100)),
    ),
    FieldSpec::new(
        "nalf",
        Int,
        &["Number of DVR points in theta from Gauss-(associated) Legendre quadrature."],
        Some(Literal::Int(60)),
    ),
    FieldSpec::new(
        "max2d",
        Int,
        &["Maximum dimension of the largest intermediate 2D Hamiltonian (ignored if IDIA = -2)."],
        Some(Literal::Int(500)),
    ),
    FieldSpec::new(
        "max3d",
        Int,
        &[
            "Maximum dimension of the final Hamiltonian.",
            "  ZCUT = F: the actual number of functions selected.",
            "  ZCUT = T: must not be less than the number of functions selected using EMAX2.",
        ],
        Some(Literal::Int(1000)),
    ),
    FieldSpec::new(
        "npnt1",
        Int,
        &["Number of DVR points in r1 from Gauss-(associated) Laguerre quadrature (ignored if IDIA = -2)."],
        Some(Literal::Int(40)),
    ),
    FieldSpec::new(
        "re1",
        Float,
        &[
            "Morse (ZMORS1 = T) or spherical oscillator parameters of r1 and r2.",
            "An unset r2 group falls back to the r1 values; ignored if IDIA = -2.",
        ],
        Some(Literal::Float(2.87)),
    ),
    FieldSpec::new("diss1", Float, &[], Some(Literal::Float(0.06))),
    FieldSpec::new("we1", Float, &[], Some(Literal::Float(0.004))),
    FieldSpec::new("re2", Float, &[], Some(Literal::Float(2.87))),
    FieldSpec::new("diss2", Float, &[], Some(Literal::Float(0.06))),
    FieldSpec::new("we2", Float, &[], Some(Literal::Float(0.004))),
];

const DVR3DRJZ_SOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "dvr3drjz_source_root",
        Str,
        &["Root path for sources."],
        None,
    ),
    FieldSpec::new(
        "dvr3drjz_sources",
        Str,
        &["DVR3DRJZ sources, separated by ';'."],
        Some(Literal::Str("potv.f90; dvr3drjz_segmented.f90")),
    ),
];

const ROTLEV_SOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("rotlev_source_root", Str, &["Root path for sources."], None),
    FieldSpec::new(
        "rotlev3b_sources",
        Str,
        &["ROTLEV sources per variant, separated by ';'."],
        Some(Literal::Str("rotlev3b_segmented.f90; f02fjf.f")),
    ),
    FieldSpec::new(
        "rotlev3z_sources",
        Str,
        &[],
        Some(Literal::Str("rotlev3z.f90; f02fjf.f")),
    ),
    FieldSpec::new(
        "rotlev3_sources",
        Str,
        &[],
        Some(Literal::Str("rotlev3.f90; f02fjf.f")),
    ),
];

const PES_SOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("pes_source_root", Str, &["Root path."], None),
    FieldSpec::new(
        "pes_sources_common",
        Str,
        &["Common PES sources, separated by ';'."],
        None,
    ),
    FieldSpec::new(
        "pes_sources_model",
        Str,
        &["Model-specific PES sources, separated by ';'."],
        None,
    ),
    FieldSpec::new(
        "pes_sources_aux",
        Str,
        &["Additional PES sources (the root path is not prepended)."],
        None,
    ),
    FieldSpec::new(
        "pes_parameters_path",
        Str,
        &["PES parameters file, relative to the root path."],
        None,
    ),
];

const BUILD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("compiler", Str, &["Compiler name."], None),
    FieldSpec::new("compiler_options", Str, &["Compiler options."], None),
    FieldSpec::new("linker_options", Str, &["Linker options."], None),
];

const RESOURCES_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "dvr3drjz_build_script",
        Str,
        &["DVR3DRJZ resources."],
        Some(Literal::Str("build_dvr3drjz.sh")),
    ),
    FieldSpec::new(
        "dvr3drjz_executable",
        Str,
        &[],
        Some(Literal::Str("dvr3drjz.x")),
    ),
    FieldSpec::new(
        "dvr3drjz_input_template",
        Str,
        &[],
        Some(Literal::Str("dvr3drjz.inp")),
    ),
    FieldSpec::new(
        "rotlev3_build_script",
        Str,
        &["ROTLEV3 resources."],
        Some(Literal::Str("build_rotlev3.sh")),
    ),
    FieldSpec::new(
        "rotlev3_executable",
        Str,
        &[],
        Some(Literal::Str("rotlev3.x")),
    ),
    FieldSpec::new(
        "rotlev3_input_template",
        Str,
        &[],
        Some(Literal::Str("rotlev3.inp")),
    ),
    FieldSpec::new(
        "rotlev3b_build_script",
        Str,
        &["ROTLEV3B resources."],
        Some(Literal::Str("build_rotlev3b.sh")),
    ),
    FieldSpec::new(
        "rotlev3b_executable",
        Str,
        &[],
        Some(Literal::Str("rotlev3b.x")),
    ),
    FieldSpec::new(
        "rotlev3b_input_template",
        Str,
        &[],
        Some(Literal::Str("rotlev3b.inp")),
    ),
    FieldSpec::new(
        "rotlev3z_build_script",
        Str,
        &["ROTLEV3Z resources."],
        Some(Literal::Str("build_rotlev3z.sh")),
    ),
    FieldSpec::new(
        "rotlev3z_executable",
        Str,
        &[],
        Some(Literal::Str("rotlev3z.x")),
    ),
    FieldSpec::new(
        "rotlev3z_input_template",
        Str,
        &[],
        Some(Literal::Str("rotlev3z.inp")),
    ),
    FieldSpec::new(
        "hosetaylor_executable",
        Str,
        &["Hose-Taylor assignment program."],
        Some(Literal::Str("hosetaylor.x")),
    ),
];

const GENERATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "jrot",
        Str,
        &["Angular momentum values, e.g. 0,1,3-5."],
        Some(Literal::Str("0")),
    ),
    FieldSpec::new(
        "kmin",
        Str,
        &["Basis parameter KMIN values."],
        Some(Literal::Str("0,1")),
    ),
    FieldSpec::new(
        "ipar",
        Str,
        &["Basis parameter IPAR values."],
        Some(Literal::Str("0,1")),
    ),
    FieldSpec::new(
        "pattern",
        Str,
        &["Naming pattern over jrot, kmin and ipar, e.g. jki_{jrot:02}{kmin}{ipar}f."],
        Some(Literal::Str(DEFAULT_STATE_PATTERN)),
    ),
    FieldSpec::new(
        "output",
        Str,
        &["Stage output for DVR-labeled states."],
        Some(Literal::Str("states.txt")),
    ),
];

const CREATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "states",
        Str,
        &["List of the states to prepare."],
        Some(Literal::Str("states.txt")),
    ),
    FieldSpec::new(
        "job_script",
        Str,
        &["Job script name."],
        Some(Literal::Str("job.sh")),
    ),
    FieldSpec::new(
        "job_manager",
        Str,
        &["Job manager: Shell or Slurm."],
        Some(Literal::Str("Shell")),
    ),
    FieldSpec::new(
        "summary",
        Str,
        &["Creation summary."],
        Some(Literal::Str("summary.out")),
    ),
];

const CALCULATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "ncores",
        Int,
        &["Number of cores per job."],
        Some(Literal::Int(10)),
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
        Some(Literal::Int(10000)),
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
    FieldSpec::new(
        "script",
        Str,
        &["Default name for the job script."],
        Some(Literal::Str("job.slurm")),
    ),
];

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: GENERAL,
        module: "general",
        header: "GENERAL SETTINGS",
        fields: GENERAL_FIELDS,
    },
    SectionSpec {
        name: MOLECULE,
        module: "molecule",
        header: "MOLECULE DEFINITION",
        fields: MOLECULE_FIELDS,
    },
    SectionSpec {
        name: DVR3DRJZ_INPUT,
        module: "dvr3drjz_input",
        header: "DVR3DRJZ AUX INPUT OPTIONS",
        fields: DVR3DRJZ_INPUT_FIELDS,
    },
    SectionSpec {
        name: DVR3DRJZ_SOURCE,
        module: "dvr3drjz_source",
        header: "PATH TO THE DVR3DRJZ SOURCE",
        fields: DVR3DRJZ_SOURCE_FIELDS,
    },
    SectionSpec {
        name: ROTLEV_SOURCE,
        module: "rotlev_source",
        header: "PATH TO THE ROTLEV SOURCE",
        fields: ROTLEV_SOURCE_FIELDS,
    },
    SectionSpec {
        name: PES_SOURCE,
        module: "pes_source",
        header: "PATH TO THE PES SOURCE",
        fields: PES_SOURCE_FIELDS,
    },
    SectionSpec {
        name: BUILD,
        module: "build",
        header: "COMPILER AND LINKER OPTIONS",
        fields: BUILD_FIELDS,
    },
    SectionSpec {
        name: RESOURCES,
        module: "resources",
        header: "RESOURCE FILES FOR COMPILED PROGRAMS",
        fields: RESOURCES_FIELDS,
    },
    SectionSpec {
        name: GENERATE,
        module: "generate",
        header: "OPTIONS FOR GENERATING THE ROTATIONAL STATES",
        fields: GENERATE_FIELDS,
    },
    SectionSpec {
        name: CREATE,
        module: "create",
        header: "CREATE SUBFOLDERS FOR ROTATIONAL STATES",
        fields: CREATE_FIELDS,
    },
    SectionSpec {
        name: CALCULATE,
        module: "calculate",
        header: "MANAGE CALC RESOURCES",
        fields: CALCULATE_FIELDS,
    },
];

const OXYGEN_16_MASS: f64 = 29156.9455997;
const OXYGEN_18_MASS: f64 = 32810.46214;
const SULFUR_32_MASS: f64 = 58281.51933;

const IFORT_OPTIONS: &str = "-O3 -ftz -zero -ip -parallel -qopenmp -traceback -fpp -fPIC -mcmodel=large -shared-intel -I\"${MKLROOT}/include\"";

const PRESETS: &[Preset] = &[
    Preset {
        module: "molecule",
        name: "OZONE_666",
        summary: "ozone principal isotopologue 16O16O16O",
        extends: None,
        values: &[
            ("isotope_left", Literal::Str("16O")),
            ("isotope_center", Literal::Str("16O")),
            ("isotope_right", Literal::Str("16O")),
            ("isotope_left_mass", Literal::Float(OXYGEN_16_MASS)),
            ("isotope_center_mass", Literal::Float(OXYGEN_16_MASS)),
            ("isotope_right_mass", Literal::Float(OXYGEN_16_MASS)),
            ("ediss", Literal::Float(8600.0)),
        ],
    },
    Preset {
        module: "molecule",
        name: "OZONE_668",
        summary: "ozone isotopologue 16O16O18O",
        extends: None,
        values: &[
            ("isotope_left", Literal::Str("16O")),
            ("isotope_center", Literal::Str("16O")),
            ("isotope_right", Literal::Str("18O")),
            ("isotope_left_mass", Literal::Float(OXYGEN_16_MASS)),
            ("isotope_center_mass", Literal::Float(OXYGEN_16_MASS)),
            ("isotope_right_mass", Literal::Float(OXYGEN_18_MASS)),
            ("ediss", Literal::Float(8600.0)),
        ],
    },
    Preset {
        module: "molecule",
        name: "S2O_226",
        summary: "disulfur monoxide 32S32S16O",
        extends: None,
        values: &[
            ("isotope_left", Literal::Str("32S")),
            ("isotope_center", Literal::Str("32S")),
            ("isotope_right", Literal::Str("16O")),
            ("isotope_left_mass", Literal::Float(SULFUR_32_MASS)),
            ("isotope_center_mass", Literal::Float(SULFUR_32_MASS)),
            ("isotope_right_mass", Literal::Float(OXYGEN_16_MASS)),
            ("ediss", Literal::Float(30000.0)),
        ],
    },
    Preset {
        module: "dvr3drjz_input",
        name: "XXL",
        summary: "large-basis calculation",
        extends: None,
        values: &[
            ("npnt2", Literal::Int(100)),
            ("neval", Literal::Int(100)),
            ("nalf", Literal::Int(130)),
            ("max2d", Literal::Int(10000)),
            ("max3d", Literal::Int(20000)),
            ("npnt1", Literal::Int(100)),
            ("re1", Literal::Float(2.87)),
            ("diss1", Literal::Float(0.06)),
            ("we1", Literal::Float(0.004)),
            ("re2", Literal::Float(2.87)),
            ("diss2", Literal::Float(0.06)),
            ("we2", Literal::Float(0.004)),
        ],
    },
    Preset {
        module: "pes_source",
        name: "PES_EXPMASS",
        summary: "generic layout of an expmass-formatted PES",
        extends: None,
        values: &[(
            "pes_sources_common",
            Literal::Str(
                "common/pes_par.f90; common/pots.f90; common/read_pes_par.f90; common/pes_noadifor.f90",
            ),
        )],
    },
    Preset {
        module: "pes_source",
        name: "OZONE_JCP2013_NR_PES",
        summary: "non-reef ozone PES (JCP 2013)",
        extends: Some("PES_EXPMASS"),
        values: &[
            ("pes_sources_model", Literal::Str("model_mep_4test/pes_.f")),
            (
                "pes_parameters_path",
                Literal::Str("model_mep_4test/JCP_2013_PARAMS/ozone_abini_NR_PES_vt_JCP_2013.par"),
            ),
        ],
    },
    Preset {
        module: "build",
        name: "Linux_ifort_oneAPI_2021_static",
        summary: "ifort with statically linked MKL (OpenMP threading)",
        extends: None,
        values: &[
            ("compiler", Literal::Str("ifort")),
            ("compiler_options", Literal::Str(IFORT_OPTIONS)),
            (
                "linker_options",
                Literal::Str(
                    "-Wl,--start-group ${MKLROOT}/lib/intel64/libmkl_intel_lp64.a ${MKLROOT}/lib/intel64/libmkl_intel_thread.a ${MKLROOT}/lib/intel64/libmkl_core.a -Wl,--end-group -liomp5 -lpthread -lm -ldl",
                ),
            ),
        ],
    },
    Preset {
        module: "build",
        name: "Linux_ifort_oneAPI_2021_dynamic",
        summary: "ifort with dynamically linked MKL (OpenMP threading)",
        extends: None,
        values: &[
            ("compiler", Literal::Str("ifort")),
            ("compiler_options", Literal::Str(IFORT_OPTIONS)),
            (
                "linker_options",
                Literal::Str(
                    "-L${MKLROOT}/lib/intel64 -lmkl_intel_lp64 -lmkl_intel_thread -lmkl_core -liomp5 -lpthread -lm -ldl",
                ),
            ),
        ],
    },
    Preset {
        module: "build",
        name: "Linux_ifort_oneAPI_2021_sdl",
        summary: "ifort with the MKL single dynamic library",
        extends: None,
        values: &[
            ("compiler", Literal::Str("ifort")),
            ("compiler_options", Literal::Str(IFORT_OPTIONS)),
            (
                "linker_options",
                Literal::Str("-L${MKLROOT}/lib/intel64 -lmkl_rt -lpthread -lm -ldl"),
            ),
        ],
    },
];

pub static POSITIONS_SCHEMA: Schema = Schema {
    project: ProjectKind::Positions,
    sections: SECTIONS,
    presets: PRESETS,
};
