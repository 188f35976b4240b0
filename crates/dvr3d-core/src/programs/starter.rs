use crate::domain::{DvrResult, SolverKind};
use crate::serialization::{write_executable_artifact, write_text_artifact};
use std::path::{Path, PathBuf};

/// Placeholder PES parameter file read by DVR3DRJZ builds that take no parameters.
pub const DUMMY_PES_FILE: &str = "pes.par";
pub const DUMMY_PES_PARAMETERS: &str =
    "*\n* DUMMY\n*\n           0           0           0  1.00000000000000                 1";

/// `<program>.sh`: runs one program with stdin/stdout redirection inside a unit directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterScript {
    pub program: SolverKind,
    pub executable: String,
    pub input_file: String,
    pub output_file: String,
    /// Shell commands run before the program, usually wavefunction links.
    pub links: Vec<String>,
}

impl StarterScript {
    pub fn new(
        program: SolverKind,
        executable: impl Into<String>,
        input_file: impl Into<String>,
    ) -> Self {
        let links = match program {
            // the restricted-basis step reads the DVR3DRJZ vectors as unit 4
            SolverKind::Rotlev3 | SolverKind::Rotlev3b | SolverKind::Rotlev3z => {
                vec!["ln -s fort.26 fort.4".to_string()]
            }
            _ => Vec::new(),
        };
        Self {
            program,
            executable: executable.into(),
            input_file: input_file.into(),
            output_file: program.output_file(),
            links,
        }
    }

    /// DIPOLE3B reads the bra wavefunctions as unit 11 and the ket ones as unit 12.
    pub fn dipole3b(
        executable: impl Into<String>,
        bra: (&str, &str),
        ket: (&str, &str),
    ) -> Self {
        let mut starter = Self::new(
            SolverKind::Dipole3b,
            executable,
            SolverKind::Dipole3b.input_file(),
        );
        starter.links = vec![
            format!("ln -sf {}/{} fort.11", bra.0, bra.1),
            format!("ln -sf {}/{} fort.12", ket.0, ket.1),
        ];
        starter
    }

    pub fn file_name(&self) -> String {
        self.program.starter_file()
    }

    pub fn render(&self) -> String {
        let stem = self.program.stem();
        let mut blocks = vec!["#!/bin/sh".to_string(), format!("echo running {} ...", stem)];
        blocks.extend(self.links.iter().cloned());
        blocks.push(format!(
            "{} < {} > {}",
            self.executable, self.input_file, self.output_file
        ));
        blocks.push(format!("echo {} ok", stem));
        blocks.join("\n\n")
    }

    /// Writes the executable starter into `directory`; DVR3DRJZ also gets its dummy `pes.par`.
    pub fn write_to(&self, directory: &Path) -> DvrResult<PathBuf> {
        if self.program == SolverKind::Dvr3drjz {
            write_text_artifact(&directory.join(DUMMY_PES_FILE), DUMMY_PES_PARAMETERS)?;
        }
        let path = directory.join(self.file_name());
        write_executable_artifact(&path, &self.render())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{DUMMY_PES_FILE, StarterScript};
    use crate::domain::SolverKind;
    use tempfile::TempDir;

    #[test]
    fn dvr3drjz_starter_redirects_stdin_and_stdout() {
        let starter = StarterScript::new(SolverKind::Dvr3drjz, "../dvr3drjz.x", "dvr3drjz.inp");
        assert_eq!(
            starter.render(),
            "#!/bin/sh\n\necho running dvr3drjz ...\n\n\
             ../dvr3drjz.x < dvr3drjz.inp > dvr3drjz.out\n\necho dvr3drjz ok"
        );
    }

    #[test]
    fn rotlev_starter_links_the_vibrational_vectors() {
        let starter = StarterScript::new(SolverKind::Rotlev3b, "../rotlev3b.x", "rotlev3b.inp");
        assert_eq!(
            starter.render(),
            "#!/bin/sh\n\necho running rotlev3b ...\n\nln -s fort.26 fort.4\n\n\
             ../rotlev3b.x < rotlev3b.inp > rotlev3b.out\n\necho rotlev3b ok"
        );
    }

    #[test]
    fn dipole3b_starter_links_bra_and_ket_records() {
        let starter = StarterScript::dipole3b(
            "../dipole3b.x",
            ("../../energies/jki_0100f", "fort.26"),
            ("../../energies/jki_0110f", "fort.8"),
        );
        let rendered = starter.render();
        assert!(rendered.contains("ln -sf ../../energies/jki_0100f/fort.26 fort.11\n\n"));
        assert!(rendered.contains("ln -sf ../../energies/jki_0110f/fort.8 fort.12\n\n"));
        assert!(rendered.contains("../dipole3b.x < dipole3b.inp > dipole3b.out"));
        assert_eq!(starter.file_name(), "dipole3b.sh");
    }

    #[test]
    fn dvr3drjz_starter_ships_a_dummy_parameter_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let starter = StarterScript::new(SolverKind::Dvr3drjz, "../dvr3drjz.x", "dvr3drjz.inp");
        let path = starter.write_to(temp.path()).expect("starter should be written");
        assert!(path.ends_with("dvr3drjz.sh"));
        assert!(temp.path().join(DUMMY_PES_FILE).is_file());
    }
}
