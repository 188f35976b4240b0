use super::JobManagerKind;
use crate::domain::{DvrError, DvrResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external command bound to the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, current_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Blocking process launcher; the exit code is `None` when the process was killed by a signal.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> DvrResult<Option<i32>>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> DvrResult<Option<i32>> {
        (**self).run(invocation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> DvrResult<Option<i32>> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .status()
            .map_err(|source| {
                DvrError::external_process(
                    "EXTERNAL.SPAWN",
                    format!(
                        "failed to execute '{}' in '{}': {}",
                        invocation.command_line(),
                        invocation.current_dir.display(),
                        source
                    ),
                )
            })?;
        Ok(status.code())
    }
}

/// Hands a unit's job script to the batch system.
pub trait JobSubmitter {
    fn submit(&self, unit_directory: &Path, job_script: &str) -> DvrResult<()>;
}

/// `sbatch <script>` for Slurm; Shell executes `<unit>/<script>` directly.
#[derive(Debug, Clone)]
pub struct BatchSubmitter<R> {
    manager: JobManagerKind,
    runner: R,
}

impl<R: ProcessRunner> BatchSubmitter<R> {
    pub fn new(manager: JobManagerKind, runner: R) -> Self {
        Self { manager, runner }
    }

    pub fn invocation(&self, unit_directory: &Path, job_script: &str) -> Invocation {
        match self.manager {
            JobManagerKind::Slurm => Invocation::new("sbatch", unit_directory).arg(job_script),
            JobManagerKind::Shell => Invocation::new(
                unit_directory.join(job_script).display().to_string(),
                unit_directory,
            ),
        }
    }
}

impl<R: ProcessRunner> JobSubmitter for BatchSubmitter<R> {
    fn submit(&self, unit_directory: &Path, job_script: &str) -> DvrResult<()> {
        let invocation = self.invocation(unit_directory, job_script);
        tracing::info!(
            command = %invocation.command_line(),
            directory = %unit_directory.display(),
            "submitting job"
        );
        match self.runner.run(&invocation)? {
            Some(0) => {}
            Some(code) => tracing::warn!(
                command = %invocation.command_line(),
                code,
                "submission command exited with a non-zero status"
            ),
            None => tracing::warn!(
                command = %invocation.command_line(),
                "submission command was terminated by a signal"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{BatchSubmitter, Invocation, JobSubmitter, ProcessRunner, SystemRunner};
    use crate::domain::{DvrErrorCategory, DvrResult};
    use crate::jobs::JobManagerKind;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    /// Records invocations instead of running them.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRunner {
        pub(crate) invocations: RefCell<Vec<Invocation>>,
        pub(crate) exit_code: Option<i32>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> DvrResult<Option<i32>> {
            self.invocations.borrow_mut().push(invocation.clone());
            Ok(self.exit_code)
        }
    }

    #[test]
    fn slurm_submission_uses_sbatch_in_the_unit_directory() {
        let runner = RecordingRunner {
            exit_code: Some(0),
            ..RecordingRunner::default()
        };
        let submitter = BatchSubmitter::new(JobManagerKind::Slurm, &runner);
        submitter
            .submit(Path::new("/project/jki_0000f"), "job.sh")
            .expect("submission should succeed");

        let invocations = runner.invocations.borrow();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].command_line(), "sbatch job.sh");
        assert_eq!(invocations[0].current_dir, Path::new("/project/jki_0000f"));
    }

    #[test]
    fn shell_submission_executes_the_script_and_tolerates_failures() {
        let runner = RecordingRunner {
            exit_code: Some(1),
            ..RecordingRunner::default()
        };
        let submitter = BatchSubmitter::new(JobManagerKind::Shell, &runner);
        submitter
            .submit(Path::new("unit"), "job.sh")
            .expect("non-zero exits are only logged");
        assert_eq!(
            Path::new(&runner.invocations.borrow()[0].program),
            Path::new("unit").join("job.sh")
        );
    }

    #[test]
    fn missing_program_is_an_external_process_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let invocation = Invocation::new("./does-not-exist.sh", temp.path());
        let error = SystemRunner
            .run(&invocation)
            .expect_err("program does not exist");
        assert_eq!(error.category(), DvrErrorCategory::ExternalProcessError);
        assert_eq!(error.placeholder(), "EXTERNAL.SPAWN");
    }
}
