use dvr3d_core::config::ParameterSet;
use dvr3d_core::config::positions::POSITIONS_SCHEMA;
use dvr3d_core::domain::{DvrErrorCategory, LABEL_DONE};
use dvr3d_core::jobs::WorkingDirectoryState;
use dvr3d_core::pipeline::{IntensitiesPipeline, PositionsPipeline, startproject};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DIPOLE3B_OUT: &str = "\n DIPOLE3B run\n\n\
    \x20ie1 ie2   ket energy   bra energy    frequency  z transition    x transition       dipole       s(f-i)      a-coefficient\n\
    \n\
    \x20  1   1        0.000       23.462       23.462   0.576154E-05  -0.317053E-02   0.316477E-02   0.100158E-04   0.857636E-09\n";

fn ozone_project(parent: &Path) -> PositionsPipeline {
    let mut params = ParameterSet::new(&POSITIONS_SCHEMA);
    params
        .apply_preset("molecule.OZONE_666")
        .expect("preset should apply");
    params
        .apply_overrides(
            "GENERAL.project=ozone; GENERATE.jrot=0-1; GENERATE.kmin=0; GENERATE.ipar=0,1",
        )
        .expect("overrides should apply");
    let config = startproject(&params, parent).expect("project should be created");
    PositionsPipeline::load(&config).expect("saved configuration should load strictly")
}

fn finish_unit(root: &Path, unit: &str, energies: Option<&str>) {
    let directory = root.join(unit);
    fs::write(directory.join(LABEL_DONE), "").expect("sentinel should be written");
    if let Some(energies) = energies {
        fs::write(directory.join("energies.out"), energies).expect("energies should be written");
    }
}

#[test]
fn positions_project_runs_from_listing_to_collection() {
    let temp = TempDir::new().expect("tempdir should be created");
    let pipeline = ozone_project(temp.path());
    let root = pipeline.layout().root().to_path_buf();

    let states = pipeline.generate().expect("listing should be generated");
    let names: Vec<&str> = states.iter().map(|state| state.name.as_str()).collect();
    assert_eq!(names, ["jki_0000f", "jki_0001f", "jki_0100f", "jki_0101f"]);
    pipeline.create().expect("units should be created");

    let fresh = pipeline.check().expect("check should succeed");
    assert!(
        fresh
            .iter()
            .all(|status| status.state == WorkingDirectoryState::NotStarted)
    );

    finish_unit(
        &root,
        "jki_0000f",
        Some("   1443.586\n* n energy j p s\n 1 0.0 0 0 0\n 2 700.5 0 0 0\n"),
    );
    finish_unit(
        &root,
        "jki_0001f",
        Some("* DVR3DRJZ\n* n energy j p s\n 1 2443.5 0 1 1\n"),
    );
    finish_unit(
        &root,
        "jki_0100f",
        Some("* ROTLEV3B\n* n energy j p s\n 1 1467.048 1 0 0\n"),
    );

    let statuses = pipeline.check().expect("check should succeed");
    let codes: Vec<u8> = statuses.iter().map(|status| status.code).collect();
    assert_eq!(codes, [0, 0, 0, 2]);

    let collection = pipeline.collect().expect("energies should aggregate");
    assert_eq!(collection.records.len(), 4);
    assert_eq!(collection.unit_count(), 3);
    assert_eq!(
        fs::read_to_string(root.join("states.ZPE")).expect("zpe should exist"),
        "1443.58600000\n"
    );
    let csv = fs::read_to_string(root.join("states.csv")).expect("csv should exist");
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.contains("2,700.5,0,0,0,0,0,0,jki_0000f"));
    let stat = fs::read_to_string(root.join("states.stat")).expect("stat should exist");
    assert!(stat.lines().last().expect("last unit").contains("jki_0101f"));
}

#[test]
fn disagreeing_zero_point_energies_stop_the_collection() {
    let temp = TempDir::new().expect("tempdir should be created");
    let pipeline = ozone_project(temp.path());
    let root = pipeline.layout().root().to_path_buf();
    pipeline.generate().expect("listing should be generated");
    pipeline.create().expect("units should be created");
    fs::write(
        root.join("states.txt"),
        "name jrot kmin ipar\njki_0000f 0 0 0\njki_0020f 0 2 0\n",
    )
    .expect("listing should be rewritten");
    fs::create_dir_all(root.join("jki_0020f")).expect("unit should be created");
    finish_unit(&root, "jki_0000f", Some("1443.586\nheader\n 1 0.0 0 0 0\n"));
    finish_unit(&root, "jki_0020f", Some("1443.600\nheader\n 1 0.0 0 0 0\n"));

    let error = pipeline.collect().expect_err("baselines disagree");
    assert_eq!(error.category(), DvrErrorCategory::ConsistencyError);
    assert!(!root.join("states.csv").exists());
}

#[test]
fn intensities_project_pairs_the_positions_units() {
    let temp = TempDir::new().expect("tempdir should be created");
    let positions = ozone_project(temp.path());
    positions.generate().expect("listing should be generated");

    let distribution = temp.path().join("dvr3d");
    for (subdirectory, executable) in [("dms", "dipole3b.x"), ("common", "spectra.x")] {
        let directory = distribution.join("exe").join(subdirectory);
        fs::create_dir_all(&directory).expect("distribution should be created");
        fs::write(directory.join(executable), "#!/bin/sh\n").expect("executable");
    }
    let spectra_root = temp.path().join("spectra");
    fs::create_dir_all(&spectra_root).expect("project should be created");
    let config = spectra_root.join("config.ini");
    fs::write(
        &config,
        format!(
            "[INIT]\nroot = {}\nmodel = dms\nroot_energies = ../ozone\nproject = o3_\n\
             ezero = 1443.586\nparfile =\n\n\
             [GENERATE]\nj_max = 1\nfilter = ipar == ipar_ and abs(jrot - jrot_) == 1\n\n\
             [CREATE]\njob_manager = Shell\n",
            distribution.display()
        ),
    )
    .expect("config should be written");

    let pipeline = IntensitiesPipeline::load(&config).expect("config should load");
    pipeline.init().expect("init should copy the inputs");
    assert!(spectra_root.join("states.txt").is_file());
    assert!(spectra_root.join("dipole3b.x").is_file());
    assert!(spectra_root.join("spectra.inp").is_file());

    let transitions = pipeline.generate().expect("transitions should be generated");
    let folders: Vec<String> = transitions.iter().map(|t| t.folder_name()).collect();
    assert_eq!(
        folders,
        [
            "jki_0000f_fort.26__jki_0100f_fort.26",
            "jki_0001f_fort.26__jki_0101f_fort.26",
            "jki_0100f_fort.26__jki_0000f_fort.26",
            "jki_0101f_fort.26__jki_0001f_fort.26",
        ]
    );
    assert_eq!(transitions[3].id, "o3_4");

    pipeline.create().expect("folders should be created");
    let folder = spectra_root.join(&folders[0]);
    let starter = fs::read_to_string(folder.join("dipole3b.sh")).expect("starter");
    assert!(starter.contains("ln -sf ../../ozone/jki_0000f/fort.26 fort.11"));
    assert!(starter.contains("../dipole3b.x < dipole3b.inp > dipole3b.out"));
    let job = fs::read_to_string(folder.join("job.slurm")).expect("job");
    assert!(!job.contains("#SBATCH"));

    fs::write(folder.join("dipole3b.out"), DIPOLE3B_OUT).expect("output should be written");
    let collection = pipeline.collect().expect("tables should aggregate");
    assert_eq!(collection.dipole.len(), 1);
    assert!(collection.spectra.is_empty());
    let csv = fs::read_to_string(spectra_root.join("dipole3b.csv")).expect("csv should exist");
    assert!(csv.lines().nth(1).expect("one row").ends_with(&format!("o3_1,{}", folders[0])));
    let stat = fs::read_to_string(spectra_root.join("transitions.stat")).expect("stat");
    assert_eq!(stat.lines().count(), 5);
}
