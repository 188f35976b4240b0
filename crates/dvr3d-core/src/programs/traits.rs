use crate::domain::{DvrResult, SolverKind};
use crate::serialization::write_text_artifact;
use std::path::Path;

/// A positional stdin record of one of the DVR3D programs.
pub trait InputRecord {
    fn kind(&self) -> SolverKind;

    /// Physical lines of the record joined by `\n`, without the final line terminator.
    fn render(&self) -> String;

    fn write_to(&self, path: &Path) -> DvrResult<()> {
        tracing::debug!(program = %self.kind(), path = %path.display(), "writing input record");
        write_text_artifact(path, &self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::InputRecord;
    use crate::domain::SolverKind;
    use crate::serialization::read_text_artifact;
    use tempfile::TempDir;

    struct TitleOnly;

    impl InputRecord for TitleOnly {
        fn kind(&self) -> SolverKind {
            SolverKind::Spectra
        }

        fn render(&self) -> String {
            "&PRT  &END\nTITLE".to_string()
        }
    }

    #[test]
    fn written_records_end_with_a_newline() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("spectra.inp");
        let records: Vec<Box<dyn InputRecord>> = vec![Box::new(TitleOnly)];
        records[0].write_to(&path).expect("record should be written");
        let written = read_text_artifact(&path).expect("record should be readable");
        assert_eq!(written, "&PRT  &END\nTITLE\n");
    }
}
