use super::CliError;
use super::helpers::*;
use dvr3d_core::config::intensities::CREATE as INTENSITIES_CREATE;
use dvr3d_core::config::positions::{CREATE as POSITIONS_CREATE, POSITIONS_SCHEMA};
use dvr3d_core::jobs::SystemRunner;
use dvr3d_core::pipeline::{CONFIG_FILE, IntensitiesPipeline, PositionsPipeline, startproject};
use std::path::PathBuf;

#[derive(clap::Args)]
#[command(group(
    clap::ArgGroup::new("stage")
        .required(true)
        .multiple(true)
        .args([
            "startproject", "templates", "init", "generate", "create", "submit", "check",
            "clean", "hose_taylor", "collect", "collect_ht",
        ])
))]
pub(super) struct PositionsArgs {
    /// Project configuration file; its directory is the project root
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Create the project directory NAME with a fresh configuration
    #[arg(long, value_name = "NAME")]
    startproject: Option<String>,

    /// Parent directory of a new project
    #[arg(long, default_value = ".", requires = "startproject")]
    directory: PathBuf,

    /// Apply a configuration preset to a new project ("help" lists them)
    #[arg(long = "template", value_name = "MODULE.PRESET")]
    templates: Vec<String>,

    /// Merge a partial configuration file into a new project; blank values are ignored
    #[arg(long, value_name = "FILE", requires = "startproject")]
    merge: Option<PathBuf>,

    /// Override settings of a new project: "SECTION.key=value; SECTION.key=value"
    #[arg(long = "set", value_name = "OVERRIDES", requires = "startproject")]
    overrides: Option<String>,

    /// Write input templates and build scripts, then compile the programs
    #[arg(long)]
    init: bool,

    /// Write the states listing
    #[arg(long)]
    generate: bool,

    /// Create one unit directory per listed state
    #[arg(long)]
    create: bool,

    /// Submit the job script of every unit that is not running
    #[arg(long)]
    submit: bool,

    /// Report the job state of every unit
    #[arg(long)]
    check: bool,

    /// Print the --check report as JSON
    #[arg(long, requires = "check")]
    json: bool,

    /// Delete the scratch files of every unit
    #[arg(long)]
    clean: bool,

    /// Run the Hose-Taylor assignment in finished units
    #[arg(long)]
    hose_taylor: bool,

    /// Aggregate energies into states.csv, states.ZPE and states.stat
    #[arg(long)]
    collect: bool,

    /// Aggregate Hose-Taylor assignments into states_ht.csv
    #[arg(long)]
    collect_ht: bool,
}

#[derive(clap::Args)]
#[command(group(
    clap::ArgGroup::new("stage")
        .required(true)
        .multiple(true)
        .args(["init", "generate", "create", "submit", "submit_spectra", "check", "collect"])
))]
pub(super) struct IntensitiesArgs {
    /// Project configuration file; its directory is the project root
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Copy the states listing and executables, then write input templates
    #[arg(long)]
    init: bool,

    /// Write the transitions listing
    #[arg(long)]
    generate: bool,

    /// Create one folder per listed transition
    #[arg(long)]
    create: bool,

    /// Submit DIPOLE3B followed by SPECTRA in every folder that is not running
    #[arg(long)]
    submit: bool,

    /// Submit SPECTRA alone in every folder that is not running
    #[arg(long)]
    submit_spectra: bool,

    /// Report the job state of every folder
    #[arg(long)]
    check: bool,

    /// Print the --check report as JSON
    #[arg(long, requires = "check")]
    json: bool,

    /// Aggregate DIPOLE3B and SPECTRA tables into CSV files
    #[arg(long)]
    collect: bool,
}

/// Runs the first requested stage in pipeline order.
pub(super) fn run_positions_command(args: PositionsArgs) -> Result<i32, CliError> {
    if args.templates.iter().any(|template| template == "help") {
        print!("{}", POSITIONS_SCHEMA.describe_presets());
        return Ok(0);
    }
    if let Some(project) = &args.startproject {
        let params = startproject_parameters(
            &POSITIONS_SCHEMA,
            project,
            &args.templates,
            args.merge.as_deref(),
            args.overrides.as_deref(),
        )?;
        let config = startproject(&params, &args.directory)?;
        println!("created project configuration {}", config.display());
        return Ok(0);
    }
    if !args.templates.is_empty() {
        return Err(CliError::Usage(
            "--template applies to a new project and requires --startproject".to_string(),
        ));
    }

    tracing::debug!(config = %args.config.display(), "loading positions project");
    let pipeline = PositionsPipeline::load(&args.config)?;
    if args.init {
        pipeline.init(&SystemRunner)?;
        println!("initialized project in {}", pipeline.layout().root().display());
    } else if args.generate {
        let states = pipeline.generate()?;
        println!("generated {} states", states.len());
    } else if args.create {
        let states = pipeline.create()?;
        println!("created {} unit directories", states.len());
    } else if args.submit {
        let submitter = batch_submitter(pipeline.params(), POSITIONS_CREATE)?;
        print_submit_report(&pipeline.submit(&submitter)?);
    } else if args.check {
        print_statuses(&pipeline.check()?, args.json)?;
    } else if args.clean {
        let report = pipeline.clean()?;
        println!(
            "removed {} scratch files ({} already absent)",
            report.removed.len(),
            report.missing.len()
        );
    } else if args.hose_taylor {
        let units = pipeline.hose_taylor(&SystemRunner)?;
        println!("assigned {} finished units", units.len());
    } else if args.collect {
        let collection = pipeline.collect()?;
        println!(
            "collected {} levels from {} units (zero-point energy {:.8})",
            collection.records.len(),
            collection.unit_count(),
            collection.baseline
        );
    } else if args.collect_ht {
        let collection = pipeline.collect_assignments()?;
        println!(
            "collected {} assignments from {} blocks",
            collection.rows.len(),
            collection.blocks.len()
        );
    }
    Ok(0)
}

pub(super) fn run_intensities_command(args: IntensitiesArgs) -> Result<i32, CliError> {
    tracing::debug!(config = %args.config.display(), "loading intensities project");
    let pipeline = IntensitiesPipeline::load(&args.config)?;
    if args.init {
        pipeline.init()?;
        println!("initialized project in {}", pipeline.layout().root().display());
    } else if args.generate {
        let transitions = pipeline.generate()?;
        println!("generated {} transitions", transitions.len());
    } else if args.create {
        let transitions = pipeline.create()?;
        println!("created {} transition folders", transitions.len());
    } else if args.submit {
        let submitter = batch_submitter(pipeline.params(), INTENSITIES_CREATE)?;
        print_submit_report(&pipeline.submit(&submitter)?);
    } else if args.submit_spectra {
        let submitter = batch_submitter(pipeline.params(), INTENSITIES_CREATE)?;
        print_submit_report(&pipeline.submit_spectra(&submitter)?);
    } else if args.check {
        print_statuses(&pipeline.check()?, args.json)?;
    } else if args.collect {
        let collection = pipeline.collect()?;
        println!(
            "collected {} dipole and {} spectra rows from {} folders",
            collection.dipole.len(),
            collection.spectra.len(),
            collection.blocks.len()
        );
    }
    Ok(0)
}
