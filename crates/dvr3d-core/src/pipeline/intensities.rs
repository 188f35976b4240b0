use super::listing::{read_states, read_transitions, render_transitions};
use super::{ProjectLayout, SubmitReport, SummaryLog, UnitStatus, from_unit, inspect_units, submit_units};
use crate::collect::{TransitionsCollection, collect_transitions};
use crate::config::intensities::{CREATE, GENERATE, INIT, INTENSITIES_SCHEMA};
use crate::config::{LoadMode, ParameterSet};
use crate::domain::{DvrResult, SolverKind, StateLabel, TransitionLabel};
use crate::expr::{Bindings, Predicate};
use crate::jobs::{JobDescriptor, JobManagerKind, JobSubmitter, ResourceRequest};
use crate::programs::{DefaultsProfile, Dipole3bInput, InputRecord, SpectraInput, StarterScript};
use crate::serialization::{
    copy_artifact, create_new_text_artifact, ensure_directory, read_text_artifact,
};
use std::path::{Path, PathBuf};

/// Runs DIPOLE3B and then SPECTRA.
pub const DIPOLE3B_JOB_SCRIPT: &str = "job.slurm";
/// Reruns SPECTRA over an existing DIPOLE3B output.
pub const SPECTRA_JOB_SCRIPT: &str = "job_spectra.slurm";

const FILTER_VARIABLES: [&str; 10] = [
    "jrot", "kmin", "ipar", "jrot_", "kmin_", "ipar_", "fort", "fort_", "name", "name_",
];

/// Stage commands of an `intensities` project; the bra and ket wavefunctions
/// live in the unit directories of a finished `positions` project.
#[derive(Debug, Clone)]
pub struct IntensitiesPipeline {
    layout: ProjectLayout,
    params: ParameterSet,
}

impl IntensitiesPipeline {
    pub fn new(layout: ProjectLayout, params: ParameterSet) -> Self {
        Self { layout, params }
    }

    /// Loads `config` over the defaults, keeping defaults for blank or missing keys.
    pub fn load(config: &Path) -> DvrResult<Self> {
        let mut params = ParameterSet::new(&INTENSITIES_SCHEMA);
        params.load(config, LoadMode::IgnoreEmpty)?;
        let root = match config.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Ok(Self::new(ProjectLayout::open(root)?, params))
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    fn energies_root(&self) -> DvrResult<&str> {
        self.params.require_str(INIT, "root_energies")
    }

    fn transitions(&self) -> DvrResult<Vec<TransitionLabel>> {
        read_transitions(&self.layout.path(self.params.require_str(CREATE, "transitions")?))
    }

    /// Copies the states listing and the executables, then writes the input
    /// templates. Files already in the project are kept.
    pub fn init(&self) -> DvrResult<()> {
        let states = self.params.require_str(INIT, "states")?;
        self.copy_missing(states, || {
            Ok(self.layout.path(self.energies_root()?).join(states))
        })?;

        let dipole3b = self.params.require_str(INIT, "dipole3b")?;
        self.copy_missing(dipole3b, || {
            Ok(self.distribution(self.params.require_str(INIT, "model")?, dipole3b)?)
        })?;
        let spectra = self.params.require_str(INIT, "spectra")?;
        self.copy_missing(spectra, || self.distribution("common", spectra))?;

        let profile = DefaultsProfile::parse(self.params.require_str(INIT, "profile")?)?;
        let dipole3b_template = self.layout.path(self.params.require_str(INIT, "dipole3b_template")?);
        if dipole3b_template.exists() {
            tracing::info!(path = %dipole3b_template.display(), "template exists, keeping it");
        } else {
            Dipole3bInput::defaults(profile).write_to(&dipole3b_template)?;
        }
        let spectra_template = self.layout.path(self.params.require_str(INIT, "spectra_template")?);
        if spectra_template.exists() {
            tracing::info!(path = %spectra_template.display(), "template exists, keeping it");
        } else {
            SpectraInput::defaults(profile).write_to(&spectra_template)?;
        }
        Ok(())
    }

    /// `<root>/exe/<subdirectory>/<file>` of the DVR3D distribution.
    fn distribution(&self, subdirectory: &str, file: &str) -> DvrResult<PathBuf> {
        Ok(self
            .layout
            .path(self.params.require_str(INIT, "root")?)
            .join("exe")
            .join(subdirectory)
            .join(file))
    }

    fn copy_missing(
        &self,
        file: &str,
        source: impl FnOnce() -> DvrResult<PathBuf>,
    ) -> DvrResult<()> {
        let destination = self.layout.path(file);
        if destination.exists() {
            tracing::info!(path = %destination.display(), "file exists, skipping copy");
            return Ok(());
        }
        let source = source()?;
        copy_artifact(&source, &destination)?;
        tracing::info!(source = %source.display(), "copied into the project");
        Ok(())
    }

    /// Writes the transitions listing: every bra/ket pair and record choice
    /// passing the J window, the ΔJ window and the filter expression.
    pub fn generate(&self) -> DvrResult<Vec<TransitionLabel>> {
        let states = read_states(&self.layout.path(self.params.require_str(INIT, "states")?))?;
        let filter = Predicate::compile(
            self.params.require_str(GENERATE, "filter")?,
            &FILTER_VARIABLES,
        )?;
        let project = self.params.require_str(INIT, "project")?;
        let j_min = self.params.require_int(GENERATE, "j_min")?;
        let j_max = self.params.require_int(GENERATE, "j_max")?;
        let j_diff_min = self.params.require_int(GENERATE, "j_diff_min")?;
        let j_diff_max = self.params.require_int(GENERATE, "j_diff_max")?;

        let mut transitions = Vec::new();
        for bra in &states {
            let jrot = i64::from(bra.jrot);
            if jrot < j_min || jrot > j_max {
                continue;
            }
            for ket in &states {
                let j_diff = jrot - i64::from(ket.jrot);
                if j_diff < j_diff_min || j_diff > j_diff_max {
                    continue;
                }
                for fort_bra in bra.wavefunction_records()? {
                    for fort_ket in ket.wavefunction_records()? {
                        if !filter.evaluate(&filter_bindings(bra, ket, fort_bra, fort_ket))? {
                            continue;
                        }
                        transitions.push(TransitionLabel {
                            id: format!("{}{}", project, transitions.len() + 1),
                            bra: bra.clone(),
                            ket: ket.clone(),
                            fort_bra: fort_bra.to_string(),
                            fort_ket: fort_ket.to_string(),
                        });
                    }
                }
            }
        }

        let output = self.layout.path(self.params.require_str(GENERATE, "output")?);
        create_new_text_artifact(&output, &render_transitions(&transitions), "IO.LISTING_EXISTS")?;
        tracing::info!(
            count = transitions.len(),
            output = %output.display(),
            "generated transitions"
        );
        Ok(transitions)
    }

    /// One folder per transition with DIPOLE3B and SPECTRA inputs, starters
    /// and the two job scripts.
    pub fn create(&self) -> DvrResult<Vec<TransitionLabel>> {
        let transitions = self.transitions()?;
        let ezero = self.params.require_float(INIT, "ezero")?;

        let template = self.layout.path(self.params.require_str(INIT, "dipole3b_template")?);
        let mut dipole3b = Dipole3bInput::parse(&read_text_artifact(&template)?)?;
        if let Some(parfile) = self.params.str_value(INIT, "parfile") {
            dipole3b.parfile = from_unit(parfile);
        }
        dipole3b.ezero = ezero;

        let template = self.layout.path(self.params.require_str(INIT, "spectra_template")?);
        let mut spectra = SpectraInput::parse(&read_text_artifact(&template)?)?;
        spectra.q = self.params.require_float(INIT, "partfun")?;
        spectra.set_prt("gz", ezero);

        let dipole3b_executable = from_unit(self.params.require_str(INIT, "dipole3b")?);
        let spectra_executable = from_unit(self.params.require_str(INIT, "spectra")?);
        let energies = Path::new(self.energies_root()?);
        let manager = JobManagerKind::parse(self.params.require_str(CREATE, "job_manager")?)?;
        let resources = ResourceRequest::from_parameters(&self.params, "")?;
        let summary_path = self.layout.path(self.params.require_str(CREATE, "summary")?);
        let mut summary = SummaryLog::create(&summary_path)?;

        for transition in &transitions {
            let folder = transition.folder_name();
            tracing::info!(unit = %folder, id = %transition.id, "creating transition folder");
            let directory = self.layout.unit(&folder);
            ensure_directory(&directory)?;

            let bra = from_unit(&energies.join(&transition.bra.name).display().to_string());
            let ket = from_unit(&energies.join(&transition.ket.name).display().to_string());
            let dipole3b_starter = StarterScript::dipole3b(
                dipole3b_executable.clone(),
                (bra.as_str(), transition.fort_bra.as_str()),
                (ket.as_str(), transition.fort_ket.as_str()),
            );
            let spectra_starter = StarterScript::new(
                SolverKind::Spectra,
                spectra_executable.clone(),
                SolverKind::Spectra.input_file(),
            );
            dipole3b.write_to(&directory.join(SolverKind::Dipole3b.input_file()))?;
            dipole3b_starter.write_to(&directory)?;
            spectra.write_to(&directory.join(SolverKind::Spectra.input_file()))?;
            spectra_starter.write_to(&directory)?;

            let resources = resources.with_job_name(&transition.id);
            JobDescriptor::for_starters(
                manager,
                resources.clone(),
                &[dipole3b_starter.file_name(), spectra_starter.file_name()],
            )
            .write_to(&directory.join(DIPOLE3B_JOB_SCRIPT))?;
            JobDescriptor::for_starters(manager, resources, &[spectra_starter.file_name()])
                .write_to(&directory.join(SPECTRA_JOB_SCRIPT))?;

            summary.record(&folder, render_transitions(std::slice::from_ref(transition)).trim_end())?;
        }
        tracing::info!(
            count = transitions.len(),
            summary = %summary_path.display(),
            "created transition folders"
        );
        Ok(transitions)
    }

    pub fn submit(&self, submitter: &dyn JobSubmitter) -> DvrResult<SubmitReport> {
        self.submit_script(DIPOLE3B_JOB_SCRIPT, submitter)
    }

    pub fn submit_spectra(&self, submitter: &dyn JobSubmitter) -> DvrResult<SubmitReport> {
        self.submit_script(SPECTRA_JOB_SCRIPT, submitter)
    }

    fn submit_script(&self, job_script: &str, submitter: &dyn JobSubmitter) -> DvrResult<SubmitReport> {
        let folders: Vec<String> = self.transitions()?.iter().map(TransitionLabel::folder_name).collect();
        submit_units(&self.layout, folders.iter().map(String::as_str), job_script, submitter)
    }

    pub fn check(&self) -> DvrResult<Vec<UnitStatus>> {
        let folders: Vec<String> = self.transitions()?.iter().map(TransitionLabel::folder_name).collect();
        inspect_units(&self.layout, folders.iter().map(String::as_str))
    }

    /// Writes `dipole3b.csv`, `spectra.csv` and `transitions.stat`.
    pub fn collect(&self) -> DvrResult<TransitionsCollection> {
        let collection = collect_transitions(self.layout.root(), &self.transitions()?)?;
        collection.write_to(self.layout.root())?;
        Ok(collection)
    }
}

fn filter_bindings(bra: &StateLabel, ket: &StateLabel, fort_bra: &str, fort_ket: &str) -> Bindings {
    Bindings::new()
        .with("jrot", bra.jrot)
        .with("kmin", bra.kmin)
        .with("ipar", bra.ipar)
        .with("jrot_", ket.jrot)
        .with("kmin_", ket.kmin)
        .with("ipar_", ket.ipar)
        .with("fort", fort_bra)
        .with("fort_", fort_ket)
        .with("name", bra.name.as_str())
        .with("name_", ket.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::IntensitiesPipeline;
    use crate::config::ParameterSet;
    use crate::config::intensities::INTENSITIES_SCHEMA;
    use crate::domain::DvrErrorCategory;
    use crate::jobs::submit::tests::RecordingRunner;
    use crate::jobs::{BatchSubmitter, JobManagerKind};
    use crate::pipeline::ProjectLayout;
    use crate::programs::{DefaultsProfile, Dipole3bInput, InputRecord, SpectraInput};
    use std::fs;
    use tempfile::TempDir;

    const STATES: &str = "      name jrot kmin ipar   comment\n\
                          \x20jki_0000f    0    0    0\n\
                          \x20jki_0100f    1    0    0\n\
                          \x20jki_0110f    1    1    0\n";

    /// `<temp>/energies` holds the states, `<temp>/spectra` is the project root.
    fn project(temp: &TempDir, overrides: &str) -> IntensitiesPipeline {
        let energies = temp.path().join("energies");
        let root = temp.path().join("spectra");
        fs::create_dir_all(&energies).expect("energies should be created");
        fs::create_dir_all(&root).expect("project should be created");
        fs::write(energies.join("states.txt"), STATES).expect("states should be written");

        let mut params = ParameterSet::new(&INTENSITIES_SCHEMA);
        params
            .apply_overrides("INIT.root_energies=../energies; GENERATE.j_max=1")
            .expect("overrides should apply");
        params.apply_overrides(overrides).expect("overrides should apply");
        IntensitiesPipeline::new(ProjectLayout::open(&root).expect("root exists"), params)
    }

    fn folder_names(pipeline: &IntensitiesPipeline) -> Vec<String> {
        pipeline
            .generate()
            .expect("transitions should be generated")
            .iter()
            .map(|transition| format!("{} {}", transition.id, transition.folder_name()))
            .collect()
    }

    #[test]
    fn init_copies_listing_and_executables_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let distribution = temp.path().join("dvr3d");
        fs::create_dir_all(distribution.join("exe").join("dms")).expect("model dir");
        fs::create_dir_all(distribution.join("exe").join("common")).expect("common dir");
        fs::write(distribution.join("exe").join("dms").join("dipole3b.x"), "dip").expect("exe");
        fs::write(distribution.join("exe").join("common").join("spectra.x"), "spe").expect("exe");
        let pipeline = project(
            &temp,
            &format!("INIT.root={}; INIT.model=dms; INIT.profile=heavy", distribution.display()),
        );

        pipeline.init().expect("init should succeed");
        let root = pipeline.layout().root();
        assert_eq!(fs::read_to_string(root.join("states.txt")).expect("states"), STATES);
        assert_eq!(fs::read_to_string(root.join("dipole3b.x")).expect("exe"), "dip");
        let template = fs::read_to_string(root.join("dipole3b.inp")).expect("template");
        assert_eq!(
            template.trim_end(),
            Dipole3bInput::defaults(DefaultsProfile::Heavy).render()
        );
        assert!(root.join("spectra.inp").is_file());

        fs::remove_dir_all(&distribution).expect("distribution should be removed");
        pipeline.init().expect("existing files are kept");
    }

    #[test]
    fn init_without_distribution_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "INIT.root=/nonexistent; INIT.model=dms");
        let error = pipeline.init().expect_err("executables cannot be copied");
        assert_eq!(error.placeholder(), "IO.COPY_ARTIFACT");
    }

    #[test]
    fn generate_applies_j_windows_and_filter() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "GENERATE.filter=jrot - jrot_ == 1");
        fs::copy(
            temp.path().join("energies").join("states.txt"),
            pipeline.layout().path("states.txt"),
        )
        .expect("states should be copied");

        assert_eq!(
            folder_names(&pipeline),
            [
                "spe1 jki_0100f_fort.26__jki_0000f_fort.26",
                "spe2 jki_0110f__fort.8__jki_0000f_fort.26",
            ]
        );
        let error = pipeline.generate().expect_err("listing exists");
        assert_eq!(error.placeholder(), "IO.LISTING_EXISTS");
    }

    #[test]
    fn j_window_limits_the_bra_block() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "GENERATE.j_max=0; GENERATE.j_diff_min=0; INIT.project=o3_");
        fs::copy(
            temp.path().join("energies").join("states.txt"),
            pipeline.layout().path("states.txt"),
        )
        .expect("states should be copied");
        assert_eq!(
            folder_names(&pipeline),
            ["o3_1 jki_0000f_fort.26__jki_0000f_fort.26"]
        );
    }

    #[test]
    fn non_boolean_filter_is_a_type_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "GENERATE.filter=jrot + 1");
        fs::copy(
            temp.path().join("energies").join("states.txt"),
            pipeline.layout().path("states.txt"),
        )
        .expect("states should be copied");
        let error = pipeline.generate().expect_err("filter is not a predicate");
        assert_eq!(error.category(), DvrErrorCategory::TypeError);
        assert!(!pipeline.layout().path("transitions.txt").exists());
    }

    #[test]
    fn create_writes_both_job_scripts() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "INIT.parfile=dms.par; INIT.ezero=1443.5");
        let root = pipeline.layout().root().to_path_buf();
        fs::copy(temp.path().join("energies").join("states.txt"), root.join("states.txt"))
            .expect("states should be copied");
        Dipole3bInput::defaults(DefaultsProfile::Lite)
            .write_to(&root.join("dipole3b.inp"))
            .expect("template");
        SpectraInput::defaults(DefaultsProfile::Lite)
            .write_to(&root.join("spectra.inp"))
            .expect("template");
        pipeline.generate().expect("transitions should be generated");

        let transitions = pipeline.create().expect("folders should be created");
        assert_eq!(transitions.len(), 9);

        let folder = root.join("jki_0110f__fort.8__jki_0000f_fort.26");
        let input = fs::read_to_string(folder.join("dipole3b.inp")).expect("input");
        let lines: Vec<&str> = input.lines().collect();
        assert_eq!(lines[1], "../dms.par");
        assert_eq!(lines[4], "1443.50000000000");
        let starter = fs::read_to_string(folder.join("dipole3b.sh")).expect("starter");
        assert!(starter.contains("ln -sf ../../energies/jki_0110f/fort.8 fort.11"));
        assert!(starter.contains("ln -sf ../../energies/jki_0000f/fort.26 fort.12"));
        let job = fs::read_to_string(folder.join("job.slurm")).expect("job");
        assert!(job.contains("#SBATCH -J spe"));
        assert!(job.contains("time ./dipole3b.sh\ntime ./spectra.sh\n"));
        let rerun = fs::read_to_string(folder.join("job_spectra.slurm")).expect("job");
        assert!(rerun.contains("time ./spectra.sh\n"));
        assert!(!rerun.contains("dipole3b"));
        let spectra = fs::read_to_string(folder.join("spectra.inp")).expect("input");
        assert!(spectra.lines().next().expect("PRT line").contains("gz="));

        let summary = fs::read_to_string(root.join("summary.out")).expect("summary");
        assert_eq!(summary.matches("dirname=").count(), 9);
    }

    #[test]
    fn spectra_reruns_use_their_own_script() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = project(&temp, "GENERATE.filter=jrot == 0 and jrot_ == 0");
        let root = pipeline.layout().root().to_path_buf();
        fs::copy(temp.path().join("energies").join("states.txt"), root.join("states.txt"))
            .expect("states should be copied");
        Dipole3bInput::defaults(DefaultsProfile::Lite)
            .write_to(&root.join("dipole3b.inp"))
            .expect("template");
        SpectraInput::defaults(DefaultsProfile::Lite)
            .write_to(&root.join("spectra.inp"))
            .expect("template");
        pipeline.generate().expect("transitions should be generated");
        pipeline.create().expect("folders should be created");

        let runner = RecordingRunner {
            exit_code: Some(0),
            ..RecordingRunner::default()
        };
        let submitter = BatchSubmitter::new(JobManagerKind::Slurm, &runner);
        let report = pipeline.submit_spectra(&submitter).expect("submit should succeed");
        assert_eq!(report.submitted, ["jki_0000f_fort.26__jki_0000f_fort.26"]);
        assert_eq!(
            runner.invocations.borrow()[0].command_line(),
            "sbatch job_spectra.slurm"
        );

        let status = pipeline.check().expect("check should succeed");
        assert_eq!(status[0].code, 2);
    }
}
