use super::listing::{extract_enumerated, read_states, render_states};
use super::{
    ProjectLayout, SubmitReport, SummaryLog, UnitStatus, from_unit, inspect_units, submit_units,
};
use crate::codec::decode_namelist_line;
use crate::collect::{
    AssignmentCollection, StatesCollection, collect_assignments, collect_states,
    read_zero_point_energy,
};
use crate::config::molecule::{CoordinateSystem, derive_idia, resolve_masses, rotlev_variant};
use crate::config::positions::{
    BUILD, CREATE, DVR3DRJZ_INPUT, DVR3DRJZ_SOURCE, GENERAL, GENERATE, MOLECULE, PES_SOURCE,
    POSITIONS_SCHEMA, RESOURCES, ROTLEV_SOURCE,
};
use crate::config::{LoadMode, ParameterSet, split_list};
use crate::domain::{DvrError, DvrResult, SolverKind, StateLabel};
use crate::expr::{Bindings, NamingTemplate};
use crate::jobs::{
    Invocation, JobDescriptor, JobManagerKind, JobSubmitter, ProcessRunner, ResourceRequest,
    WorkingDirectoryState,
};
use crate::programs::{
    DefaultsProfile, Dvr3drjzInput, InputRecord, MorseParameters, RotlevInput, StarterScript,
};
use crate::serialization::{
    copy_artifact, create_new_text_artifact, ensure_directory, write_executable_artifact,
};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.ini";

const NAMING_VARIABLES: [&str; 3] = ["jrot", "kmin", "ipar"];
const ROTLEV_VARIANTS: [SolverKind; 3] =
    [SolverKind::Rotlev3, SolverKind::Rotlev3b, SolverKind::Rotlev3z];

/// Creates `<parent>/<project>/config.ini`; an existing project directory is an error.
pub fn startproject(params: &ParameterSet, parent: &Path) -> DvrResult<PathBuf> {
    let project = params.require_str(GENERAL, "project")?;
    let directory = parent.join(project);
    if directory.exists() {
        return Err(DvrError::io_system(
            "IO.PROJECT_EXISTS",
            format!("'{}' directory already exists", directory.display()),
        ));
    }
    ensure_directory(&directory)?;
    let config = directory.join(CONFIG_FILE);
    params.save(&config)?;
    tracing::info!(project, config = %config.display(), "created new project");
    Ok(config)
}

/// `#!/bin/sh` compile-and-link script: one source per continuation line.
pub fn render_build_script(
    compiler: &str,
    executable: &str,
    compiler_options: &str,
    sources: &[String],
    linker_options: &str,
) -> String {
    let mut text = format!("#!/bin/sh\n{} -o {} \\\n {} \\\n", compiler, executable, compiler_options);
    for source in sources {
        text.push_str(&format!(" {} \\\n", source));
    }
    text.push_str(linker_options);
    text
}

fn joined_sources(root: Option<&str>, list: Option<&str>) -> Vec<String> {
    split_list(list.unwrap_or_default())
        .into_iter()
        .map(|source| match root {
            Some(root) => Path::new(root).join(source).display().to_string(),
            None => source.to_string(),
        })
        .collect()
}

/// The DVR3DRJZ record and the restricted-basis record shared by every state,
/// plus the program files they run with.
#[derive(Debug, Clone, PartialEq)]
pub struct RovibModel {
    pub dvr: Dvr3drjzInput,
    pub rotlev: RotlevInput,
    pub dvr3drjz_executable: String,
    pub dvr3drjz_input: String,
    pub rotlev_executable: String,
    pub rotlev_input: String,
}

impl RovibModel {
    pub fn from_parameters(params: &ParameterSet) -> DvrResult<Self> {
        let masses = resolve_masses(params)?;
        let coordinates =
            CoordinateSystem::parse(params.require_str(DVR3DRJZ_INPUT, "coordinates")?)?;
        let idia = derive_idia(coordinates, &masses);
        let variant = rotlev_variant(idia)?;

        let int = |key: &str| params.require_int(DVR3DRJZ_INPUT, key);
        let float = |key: &str| params.require_float(DVR3DRJZ_INPUT, key);
        let emax = params.require_float(MOLECULE, "ediss")?
            + params.require_float(MOLECULE, "ediss_offset")?;
        let morse1 = MorseParameters::new(float("re1")?, float("diss1")?, float("we1")?);
        let morse2 = MorseParameters::new(float("re2")?, float("diss2")?, float("we2")?);

        let mut dvr = Dvr3drjzInput::defaults(DefaultsProfile::Lite);
        dvr.prt = decode_namelist_line(params.require_str(DVR3DRJZ_INPUT, "prt")?)?;
        dvr.var = decode_namelist_line(params.require_str(DVR3DRJZ_INPUT, "var")?)?;
        dvr.parfile = params
            .str_value(PES_SOURCE, "pes_parameters_path")
            .and_then(|path| Path::new(path).file_name())
            .map(|name| from_unit(&name.to_string_lossy()));
        dvr.ncoord = int("ncoord")?;
        dvr.npnt2 = int("npnt2")?;
        dvr.neval = int("neval")?;
        dvr.nalf = int("nalf")?;
        dvr.max2d = int("max2d")?;
        dvr.max3d = int("max3d")?;
        dvr.npnt1 = int("npnt1")?;
        dvr.idia = idia;
        dvr.xmass = masses;
        dvr.emax1 = emax;
        dvr.emax2 = emax;
        dvr.morse1 = morse1;
        dvr.morse2 = (morse2 != morse1).then_some(morse2);
        dvr.ezero = params.require_float(MOLECULE, "ezero")?;

        let rotlev = RotlevInput::following(variant, &dvr)?;
        let resource = |stem: &str, suffix: &str| -> DvrResult<String> {
            Ok(params
                .require_str(RESOURCES, &format!("{}_{}", stem, suffix))?
                .to_string())
        };
        Ok(Self {
            dvr3drjz_executable: resource(SolverKind::Dvr3drjz.stem(), "executable")?,
            dvr3drjz_input: resource(SolverKind::Dvr3drjz.stem(), "input_template")?,
            rotlev_executable: resource(variant.stem(), "executable")?,
            rotlev_input: resource(variant.stem(), "input_template")?,
            dvr,
            rotlev,
        })
    }

    pub fn variant(&self) -> SolverKind {
        self.rotlev.variant
    }

    /// Records for one rotational block; no restricted-basis step for J=0.
    pub fn for_state(&self, state: &StateLabel) -> (Dvr3drjzInput, Option<RotlevInput>) {
        let mut dvr = self.dvr.clone();
        dvr.jrot = i64::from(state.jrot);
        dvr.kmin = i64::from(state.kmin);
        dvr.ipar = i64::from(state.ipar);
        let rotlev = (state.jrot > 0).then(|| {
            let mut rotlev = self.rotlev.clone();
            rotlev.kmin = dvr.kmin;
            rotlev
        });
        (dvr, rotlev)
    }

    pub fn dvr3drjz_starter(&self) -> StarterScript {
        StarterScript::new(
            SolverKind::Dvr3drjz,
            from_unit(&self.dvr3drjz_executable),
            self.dvr3drjz_input.clone(),
        )
    }

    pub fn rotlev_starter(&self) -> StarterScript {
        StarterScript::new(
            self.variant(),
            from_unit(&self.rotlev_executable),
            self.rotlev_input.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Stage commands of a `positions` project rooted at the config file's directory.
#[derive(Debug, Clone)]
pub struct PositionsPipeline {
    layout: ProjectLayout,
    params: ParameterSet,
}

impl PositionsPipeline {
    pub fn new(layout: ProjectLayout, params: ParameterSet) -> Self {
        Self { layout, params }
    }

    /// Loads `config` strictly; its directory becomes the project root.
    pub fn load(config: &Path) -> DvrResult<Self> {
        let mut params = ParameterSet::new(&POSITIONS_SCHEMA);
        params.load(config, LoadMode::Strict)?;
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

    fn states(&self) -> DvrResult<Vec<StateLabel>> {
        read_states(&self.layout.path(self.params.require_str(CREATE, "states")?))
    }

    /// Input templates, build scripts, compilation and the PES parameter copy.
    pub fn init(&self, runner: &dyn ProcessRunner) -> DvrResult<()> {
        let model = RovibModel::from_parameters(&self.params)?;
        let root = self.layout.root();
        model.dvr.write_to(&self.layout.path(&model.dvr3drjz_input))?;
        model.rotlev.write_to(&self.layout.path(&model.rotlev_input))?;

        let dvr3drjz_script = self.write_dvr3drjz_build_script()?;
        let mut rotlev_script = None;
        for variant in ROTLEV_VARIANTS {
            let script = self.write_rotlev_build_script(variant)?;
            if variant == model.variant() {
                rotlev_script = Some(script);
            }
        }
        for script in std::iter::once(dvr3drjz_script).chain(rotlev_script) {
            tracing::info!(script = %script.display(), "running build script");
            let invocation = Invocation::new(script.display().to_string(), root);
            match runner.run(&invocation)? {
                Some(0) => {}
                code => tracing::warn!(
                    script = %script.display(),
                    code = ?code,
                    "build script did not finish cleanly"
                ),
            }
        }

        if let Some(parameters) = self.params.str_value(PES_SOURCE, "pes_parameters_path") {
            let source = match self.params.str_value(PES_SOURCE, "pes_source_root") {
                Some(pes_root) => self.layout.path(pes_root).join(parameters),
                None => self.layout.path(parameters),
            };
            let name = source.file_name().ok_or_else(|| {
                DvrError::lookup(
                    "LOOKUP.PES_PARAMETERS",
                    format!("PES parameters path '{}' has no file name", parameters),
                )
            })?;
            copy_artifact(&source, &self.layout.path(name))?;
            tracing::info!(source = %source.display(), "copied PES parameters");
        }
        Ok(())
    }

    fn build(&self) -> DvrResult<(&str, &str, &str)> {
        Ok((
            self.params.require_str(BUILD, "compiler")?,
            self.params.str_value(BUILD, "compiler_options").unwrap_or_default(),
            self.params.str_value(BUILD, "linker_options").unwrap_or_default(),
        ))
    }

    fn write_dvr3drjz_build_script(&self) -> DvrResult<PathBuf> {
        let (compiler, options, linker) = self.build()?;
        let pes_root = self.params.str_value(PES_SOURCE, "pes_source_root");
        let mut sources =
            joined_sources(pes_root, self.params.str_value(PES_SOURCE, "pes_sources_common"));
        sources.extend(joined_sources(
            pes_root,
            self.params.str_value(PES_SOURCE, "pes_sources_model"),
        ));
        sources.extend(joined_sources(
            None,
            self.params.str_value(PES_SOURCE, "pes_sources_aux"),
        ));
        sources.extend(joined_sources(
            self.params.str_value(DVR3DRJZ_SOURCE, "dvr3drjz_source_root"),
            self.params.str_value(DVR3DRJZ_SOURCE, "dvr3drjz_sources"),
        ));
        let script = self
            .layout
            .path(self.params.require_str(RESOURCES, "dvr3drjz_build_script")?);
        let executable = self.params.require_str(RESOURCES, "dvr3drjz_executable")?;
        write_executable_artifact(
            &script,
            &render_build_script(compiler, executable, options, &sources, linker),
        )?;
        Ok(script)
    }

    fn write_rotlev_build_script(&self, variant: SolverKind) -> DvrResult<PathBuf> {
        let (compiler, options, linker) = self.build()?;
        let stem = variant.stem();
        let sources = joined_sources(
            self.params.str_value(ROTLEV_SOURCE, "rotlev_source_root"),
            self.params
                .str_value(ROTLEV_SOURCE, &format!("{}_sources", stem)),
        );
        let script = self
            .layout
            .path(self.params.require_str(RESOURCES, &format!("{}_build_script", stem))?);
        let executable = self
            .params
            .require_str(RESOURCES, &format!("{}_executable", stem))?;
        write_executable_artifact(
            &script,
            &render_build_script(compiler, executable, options, &sources, linker),
        )?;
        Ok(script)
    }

    /// Writes the states listing: the cross product of the J, kmin and ipar enumerations.
    pub fn generate(&self) -> DvrResult<Vec<StateLabel>> {
        let enumeration = |key: &str| -> DvrResult<Vec<u32>> {
            extract_enumerated(self.params.require_str(GENERATE, key)?)
        };
        let (jrot_values, kmin_values, ipar_values) =
            (enumeration("jrot")?, enumeration("kmin")?, enumeration("ipar")?);
        let pattern = NamingTemplate::compile(
            self.params.require_str(GENERATE, "pattern")?,
            &NAMING_VARIABLES,
        )?;

        let mut states = Vec::new();
        for &jrot in &jrot_values {
            for &kmin in &kmin_values {
                for &ipar in &ipar_values {
                    let name = pattern.render(
                        &Bindings::new()
                            .with("jrot", jrot)
                            .with("kmin", kmin)
                            .with("ipar", ipar),
                    )?;
                    states.push(StateLabel::new(
                        name,
                        jrot,
                        u8::try_from(kmin).unwrap_or(u8::MAX),
                        u8::try_from(ipar).unwrap_or(u8::MAX),
                    )?);
                }
            }
        }

        let output = self.layout.path(self.params.require_str(GENERATE, "output")?);
        create_new_text_artifact(&output, &render_states(&states), "IO.LISTING_EXISTS")?;
        tracing::info!(count = states.len(), output = %output.display(), "generated states");
        Ok(states)
    }

    /// Materializes one unit directory per listed state.
    pub fn create(&self) -> DvrResult<Vec<StateLabel>> {
        let states = self.states()?;
        let model = RovibModel::from_parameters(&self.params)?;
        let manager = JobManagerKind::parse(self.params.require_str(CREATE, "job_manager")?)?;
        let resources = ResourceRequest::from_parameters(&self.params, "")?;
        let job_script = self.params.require_str(CREATE, "job_script")?;
        let summary_path = self.layout.path(self.params.require_str(CREATE, "summary")?);
        let mut summary = SummaryLog::create(&summary_path)?;

        for state in &states {
            tracing::info!(unit = %state.name, "creating unit");
            let directory = self.layout.unit(&state.name);
            ensure_directory(&directory)?;

            let (dvr, rotlev) = model.for_state(state);
            let mut description = format!(
                "jrot={}, kmin={}, ipar={}\n",
                state.jrot, state.kmin, state.ipar
            );
            dvr.write_to(&directory.join(&model.dvr3drjz_input))?;
            let dvr_starter = model.dvr3drjz_starter();
            dvr_starter.write_to(&directory)?;
            describe(&mut description, &model.dvr3drjz_input, &dvr.render());
            describe(&mut description, &dvr_starter.file_name(), &dvr_starter.render());

            let mut starters = vec![dvr_starter.file_name()];
            if let Some(rotlev) = rotlev {
                rotlev.write_to(&directory.join(&model.rotlev_input))?;
                let rotlev_starter = model.rotlev_starter();
                rotlev_starter.write_to(&directory)?;
                describe(&mut description, &model.rotlev_input, &rotlev.render());
                describe(&mut description, &rotlev_starter.file_name(), &rotlev_starter.render());
                starters.push(rotlev_starter.file_name());
            }

            let job = JobDescriptor::for_starters(
                manager,
                resources.with_job_name(&state.name),
                &starters,
            );
            job.write_to(&directory.join(job_script))?;
            describe(&mut description, job_script, &job.render());
            summary.record(&state.name, &description)?;
        }
        tracing::info!(
            count = states.len(),
            summary = %summary_path.display(),
            "created unit directories"
        );
        Ok(states)
    }

    pub fn submit(&self, submitter: &dyn JobSubmitter) -> DvrResult<SubmitReport> {
        let states = self.states()?;
        submit_units(
            &self.layout,
            states.iter().map(|state| state.name.as_str()),
            self.params.require_str(CREATE, "job_script")?,
            submitter,
        )
    }

    pub fn check(&self) -> DvrResult<Vec<UnitStatus>> {
        let states = self.states()?;
        inspect_units(&self.layout, states.iter().map(|state| state.name.as_str()))
    }

    /// Deletes the scratch files of every unit; absent files are only reported.
    pub fn clean(&self) -> DvrResult<CleanReport> {
        let mut report = CleanReport::default();
        for state in self.states()? {
            tracing::info!(unit = %state.name, "cleaning unit");
            for file in state.scratch_files() {
                let path = self.layout.unit(&state.name).join(file);
                if !path.is_file() {
                    tracing::info!(path = %path.display(), "skipping missing file");
                    report.missing.push(path);
                    continue;
                }
                fs::remove_file(&path).map_err(|source| {
                    DvrError::io_system(
                        "IO.REMOVE_ARTIFACT",
                        format!("failed to remove '{}': {}", path.display(), source),
                    )
                })?;
                report.removed.push(path);
            }
        }
        Ok(report)
    }

    /// Runs the Hose-Taylor assignment over the wavefunction records of finished units.
    pub fn hose_taylor(&self, runner: &dyn ProcessRunner) -> DvrResult<Vec<String>> {
        let zero_point_energy = read_zero_point_energy(self.layout.root())?;
        let executable = self
            .layout
            .path(self.params.require_str(RESOURCES, "hosetaylor_executable")?);
        let mut processed = Vec::new();
        for state in self.states()? {
            tracing::info!(unit = %state.name, "assigning rotational quantum numbers");
            let directory = self.layout.unit(&state.name);
            let status = WorkingDirectoryState::inspect(&directory);
            if status != WorkingDirectoryState::Done {
                tracing::warn!(unit = %state.name, %status, "skipping unfinished unit");
                continue;
            }
            for record in state.wavefunction_records()? {
                let invocation = Invocation::new(executable.display().to_string(), &directory)
                    .arg(format!("{:.11}", zero_point_energy))
                    .arg(*record);
                if runner.run(&invocation)? != Some(0) {
                    tracing::warn!(
                        command = %invocation.command_line(),
                        unit = %state.name,
                        "assignment program did not finish cleanly"
                    );
                }
            }
            processed.push(state.name);
        }
        Ok(processed)
    }

    /// Writes `states.csv`, `states.ZPE` and `states.stat`.
    pub fn collect(&self) -> DvrResult<StatesCollection> {
        let collection = collect_states(self.layout.root(), &self.states()?)?;
        collection.write_to(self.layout.root())?;
        Ok(collection)
    }

    /// Writes `states_ht.csv` and `states_ht.stat`.
    pub fn collect_assignments(&self) -> DvrResult<AssignmentCollection> {
        let collection = collect_assignments(self.layout.root(), &self.states()?)?;
        collection.write_to(self.layout.root())?;
        Ok(collection)
    }
}

fn describe(description: &mut String, file: &str, content: &str) {
    description.push_str(&format!("\n----- {} -----\n{}\n", file, content));
}

#[cfg(test)]
mod tests {
    use super::{PositionsPipeline, RovibModel, render_build_script, startproject};
    use crate::config::ParameterSet;
    use crate::config::positions::POSITIONS_SCHEMA;
    use crate::domain::{DvrErrorCategory, LABEL_DONE, SolverKind, StateLabel};
    use crate::jobs::submit::tests::RecordingRunner;
    use crate::jobs::{BatchSubmitter, JobManagerKind};
    use crate::pipeline::ProjectLayout;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn ozone() -> ParameterSet {
        let mut params = ParameterSet::new(&POSITIONS_SCHEMA);
        params
            .apply_overrides(
                "GENERAL.project=ozone; MOLECULE.isotope_left=16O; MOLECULE.isotope_center=16O; \
                 MOLECULE.isotope_right=16O; MOLECULE.ediss=8600; BUILD.compiler=ifort; \
                 GENERATE.jrot=0-1; GENERATE.kmin=0; GENERATE.ipar=0,1",
            )
            .expect("overrides should apply");
        params
    }

    fn pipeline(temp: &TempDir, params: ParameterSet) -> PositionsPipeline {
        PositionsPipeline::new(
            ProjectLayout::open(temp.path()).expect("root exists"),
            params,
        )
    }

    #[test]
    fn model_derives_masses_and_solver_variant() {
        let model = RovibModel::from_parameters(&ozone()).expect("model should build");
        assert_eq!(model.dvr.idia, -2);
        assert_eq!(model.variant(), SolverKind::Rotlev3b);
        assert_eq!(model.dvr.emax1, 13600.0);
        assert_eq!(model.dvr.parfile, None);
        assert_eq!(model.dvr.morse2, None);
        assert_eq!(model.rotlev_executable, "rotlev3b.x");

        let mut params = ozone();
        params
            .apply_overrides("MOLECULE.isotope_right=18O; PES_SOURCE.pes_parameters_path=pes/o3.par")
            .expect("overrides should apply");
        let model = RovibModel::from_parameters(&params).expect("model should build");
        assert_eq!(model.dvr.idia, -1);
        assert_eq!(model.variant(), SolverKind::Rotlev3);
        assert_eq!(model.dvr.parfile.as_deref(), Some("../o3.par"));
    }

    #[test]
    fn vibrational_blocks_skip_the_rotational_step() {
        let model = RovibModel::from_parameters(&ozone()).expect("model should build");
        let (dvr, rotlev) = model.for_state(&StateLabel::new("v", 0, 1, 1).expect("label"));
        assert_eq!((dvr.jrot, dvr.kmin, dvr.ipar), (0, 1, 1));
        assert!(rotlev.is_none());
        let (_, rotlev) = model.for_state(&StateLabel::new("r", 2, 2, 0).expect("label"));
        assert_eq!(rotlev.expect("J>0 has a rotational step").kmin, 2);
    }

    #[test]
    fn build_script_lists_one_source_per_line() {
        let script = render_build_script(
            "ifort",
            "dvr3drjz.x",
            "-O3",
            &["pes/common.f90".to_string(), "src/dvr3drjz.f90".to_string()],
            "-lmkl",
        );
        assert_eq!(
            script,
            "#!/bin/sh\nifort -o dvr3drjz.x \\\n -O3 \\\n pes/common.f90 \\\n src/dvr3drjz.f90 \\\n-lmkl"
        );
    }

    #[test]
    fn startproject_refuses_existing_directories() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = startproject(&ozone(), temp.path()).expect("project should be created");
        assert_eq!(config, temp.path().join("ozone").join("config.ini"));
        assert!(config.is_file());
        let error = startproject(&ozone(), temp.path()).expect_err("project exists");
        assert_eq!(error.placeholder(), "IO.PROJECT_EXISTS");
    }

    #[test]
    fn init_writes_templates_and_runs_selected_builds() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        let runner = RecordingRunner {
            exit_code: Some(0),
            ..RecordingRunner::default()
        };
        pipeline.init(&runner).expect("init should succeed");

        let root = pipeline.layout().root();
        for file in [
            "dvr3drjz.inp",
            "rotlev3b.inp",
            "build_dvr3drjz.sh",
            "build_rotlev3.sh",
            "build_rotlev3b.sh",
            "build_rotlev3z.sh",
        ] {
            assert!(root.join(file).is_file(), "{file} should exist");
        }
        let build = fs::read_to_string(root.join("build_dvr3drjz.sh")).expect("script readable");
        assert!(build.contains(" potv.f90 \\\n dvr3drjz_segmented.f90 \\\n"));

        let invocations = runner.invocations.borrow();
        let programs: Vec<&str> = invocations
            .iter()
            .map(|invocation| invocation.program.as_str())
            .collect();
        assert_eq!(programs.len(), 2);
        assert!(programs[0].ends_with("build_dvr3drjz.sh"));
        assert!(programs[1].ends_with("build_rotlev3b.sh"));
        assert_eq!(invocations[0].current_dir, root);
    }

    #[test]
    fn generate_refuses_to_overwrite_the_listing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        let states = pipeline.generate().expect("listing should be generated");
        let names: Vec<&str> = states.iter().map(|state| state.name.as_str()).collect();
        assert_eq!(names, ["jki_0000f", "jki_0001f", "jki_0100f", "jki_0101f"]);

        let listing = temp.path().join("states.txt");
        let before = fs::read_to_string(&listing).expect("listing readable");
        let error = pipeline.generate().expect_err("listing exists");
        assert_eq!(error.placeholder(), "IO.LISTING_EXISTS");
        assert_eq!(fs::read_to_string(&listing).expect("listing readable"), before);
    }

    #[test]
    fn generate_rejects_out_of_range_kmin() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut params = ozone();
        params
            .apply_overrides("GENERATE.kmin=0-3")
            .expect("override should apply");
        let error = pipeline(&temp, params).generate().expect_err("kmin=3 is invalid");
        assert_eq!(error.category(), DvrErrorCategory::LookupError);
        assert!(!temp.path().join("states.txt").exists());
    }

    #[test]
    fn create_materializes_every_unit() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        pipeline.generate().expect("listing should be generated");
        let states = pipeline.create().expect("units should be created");
        assert_eq!(states.len(), 4);

        let vibrational = temp.path().join("jki_0000f");
        for file in ["dvr3drjz.inp", "dvr3drjz.sh", "pes.par", "job.sh"] {
            assert!(vibrational.join(file).is_file(), "{file} should exist");
        }
        assert!(!vibrational.join("rotlev3b.inp").exists());

        let rotational = temp.path().join("jki_0101f");
        let job = fs::read_to_string(rotational.join("job.sh")).expect("job readable");
        assert!(job.contains("time ./dvr3drjz.sh\ntime ./rotlev3b.sh\n"));
        assert!(!job.contains("#SBATCH"));
        let input = fs::read_to_string(rotational.join("dvr3drjz.inp")).expect("input readable");
        assert!(input.lines().nth(4).expect("control line").starts_with("   40    1"));

        let summary = fs::read_to_string(temp.path().join("summary.out")).expect("summary");
        assert_eq!(summary.matches("dirname=").count(), 4);
    }

    #[test]
    fn clean_reports_missing_scratch_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        fs::write(
            temp.path().join("states.txt"),
            "name jrot kmin ipar\njki_0000f 0 0 0\njki_0210f 2 1 0\n",
        )
        .expect("listing should be written");
        for unit in ["jki_0000f", "jki_0210f"] {
            fs::create_dir_all(temp.path().join(unit)).expect("unit should be created");
        }
        fs::write(temp.path().join("jki_0210f").join("fort.26"), "").expect("scratch");

        let report = pipeline.clean().expect("clean should succeed");
        assert_eq!(report.removed.len(), 1);
        assert!(report.removed[0].ends_with(Path::new("jki_0210f").join("fort.26")));
        assert_eq!(report.missing.len(), 2);
        assert!(!temp.path().join("jki_0210f").join("fort.26").exists());
    }

    #[test]
    fn hose_taylor_runs_in_finished_units_only() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        fs::write(
            temp.path().join("states.txt"),
            "name jrot kmin ipar\njki_0220f 2 2 0\njki_0100f 1 0 0\n",
        )
        .expect("listing should be written");
        fs::write(temp.path().join("states.ZPE"), "1443.58613558\n").expect("zpe");
        fs::create_dir_all(temp.path().join("jki_0220f")).expect("unit");
        fs::write(temp.path().join("jki_0220f").join(LABEL_DONE), "").expect("sentinel");
        fs::create_dir_all(temp.path().join("jki_0100f")).expect("unit");

        let runner = RecordingRunner {
            exit_code: Some(0),
            ..RecordingRunner::default()
        };
        let processed = pipeline.hose_taylor(&runner).expect("assignment should run");
        assert_eq!(processed, ["jki_0220f"]);
        let invocations = runner.invocations.borrow();
        let lines: Vec<String> = invocations
            .iter()
            .map(|invocation| invocation.args.join(" "))
            .collect();
        assert_eq!(lines, ["1443.58613558000 fort.8", "1443.58613558000 fort.9"]);
        assert!(invocations[0].program.ends_with("hosetaylor.x"));
    }

    #[test]
    fn submit_uses_the_configured_job_script() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = pipeline(&temp, ozone());
        pipeline.generate().expect("listing should be generated");
        pipeline.create().expect("units should be created");
        let runner = RecordingRunner {
            exit_code: Some(0),
            ..RecordingRunner::default()
        };
        let submitter = BatchSubmitter::new(JobManagerKind::Slurm, &runner);
        let report = pipeline.submit(&submitter).expect("submit should succeed");
        assert_eq!(report.submitted.len(), 4);
        assert_eq!(runner.invocations.borrow()[0].command_line(), "sbatch job.sh");
    }
}
