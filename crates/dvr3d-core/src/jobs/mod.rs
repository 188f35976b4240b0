//! Job scripts wrapping starter invocations, the sentinel protocol and submission.

mod state;
pub(crate) mod submit;

pub use state::WorkingDirectoryState;
pub use submit::{BatchSubmitter, Invocation, JobSubmitter, ProcessRunner, SystemRunner};

use crate::config::ParameterSet;
use crate::domain::{DvrError, DvrResult, LABEL_DONE, LABEL_RUNNING};
use crate::serialization::write_executable_artifact;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Section holding the resource request in both project schemas.
const CALCULATE: &str = "CALCULATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobManagerKind {
    /// `sbatch` with `#SBATCH` directives.
    Slurm,
    /// The job script is executed directly and blocks until it finishes.
    Shell,
}

impl JobManagerKind {
    pub fn parse(text: &str) -> DvrResult<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "slurm" => Ok(Self::Slurm),
            "shell" => Ok(Self::Shell),
            _ => Err(DvrError::lookup(
                "LOOKUP.JOB_MANAGER",
                format!("unknown job manager '{}'", text.trim()),
            )),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slurm => "Slurm",
            Self::Shell => "Shell",
        }
    }
}

impl Display for JobManagerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub job_name: String,
    pub ncores: u32,
    pub nnodes: u32,
    pub memory_mb: u64,
    pub walltime_hours: u32,
    pub partition: String,
}

impl ResourceRequest {
    /// Reads `[CALCULATE]`; every key is required.
    pub fn from_parameters(params: &ParameterSet, job_name: impl Into<String>) -> DvrResult<Self> {
        Ok(Self {
            job_name: job_name.into(),
            ncores: positive(params, "ncores")?,
            nnodes: positive(params, "nnodes")?,
            memory_mb: u64::from(positive(params, "memory")?),
            walltime_hours: positive(params, "walltime")?,
            partition: params.require_str(CALCULATE, "partition")?.to_string(),
        })
    }

    pub fn with_job_name(&self, job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            ..self.clone()
        }
    }
}

fn positive(params: &ParameterSet, key: &str) -> DvrResult<u32> {
    let value = params.require_int(CALCULATE, key)?;
    u32::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            DvrError::type_mismatch(
                "TYPE.RESOURCE_REQUEST",
                format!("[{}] {} must be a positive integer, got {}", CALCULATE, key, value),
            )
        })
}

/// Renders a job script: shebang, scheduler directives (Slurm only), the OpenMP
/// thread count and then one command per line.
pub fn build_job_script(
    manager: JobManagerKind,
    request: &ResourceRequest,
    commands: &[String],
) -> String {
    let mut body = String::from("#!/bin/sh\n");
    if manager == JobManagerKind::Slurm {
        body.push('\n');
        body.push_str(&format!("#SBATCH -J {}\n", request.job_name));
        body.push_str(&format!("#SBATCH -c {}\n", request.ncores));
        body.push_str(&format!("#SBATCH -N {}\n", request.nnodes));
        body.push_str(&format!("#SBATCH --mem {}\n", request.memory_mb));
        body.push_str(&format!("#SBATCH --time={}:00:00\n", request.walltime_hours));
        body.push_str(&format!("#SBATCH --partition {}\n", request.partition));
    }
    body.push_str(&format!("\nexport OMP_NUM_THREADS={}\n", request.ncores));
    for command in commands {
        body.push('\n');
        body.push_str(command);
    }
    body
}

/// Runs each starter between the sentinel updates: a crash leaves `===RUNNING===`
/// without `===DONE===`.
pub fn wrap_with_sentinels<S: AsRef<str>>(starters: &[S]) -> Vec<String> {
    let mut commands = vec![
        format!("rm -f {}", LABEL_DONE),
        format!("touch {}", LABEL_RUNNING),
    ];
    commands.extend(
        starters
            .iter()
            .map(|starter| format!("time ./{}", starter.as_ref())),
    );
    commands.push(format!("rm -f {}", LABEL_RUNNING));
    commands.push(format!("touch {}", LABEL_DONE));
    commands
}

/// One job script, fixed once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub manager: JobManagerKind,
    pub resources: ResourceRequest,
    pub commands: Vec<String>,
}

impl JobDescriptor {
    /// A job running `starters` in order under the sentinel protocol.
    pub fn for_starters<S: AsRef<str>>(
        manager: JobManagerKind,
        resources: ResourceRequest,
        starters: &[S],
    ) -> Self {
        Self {
            manager,
            resources,
            commands: wrap_with_sentinels(starters),
        }
    }

    pub fn render(&self) -> String {
        build_job_script(self.manager, &self.resources, &self.commands)
    }

    pub fn write_to(&self, path: &Path) -> DvrResult<()> {
        tracing::debug!(path = %path.display(), manager = %self.manager, "writing job script");
        write_executable_artifact(path, &self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::{JobDescriptor, JobManagerKind, ResourceRequest, build_job_script, wrap_with_sentinels};
    use crate::config::ParameterSet;
    use crate::config::positions::POSITIONS_SCHEMA;
    use crate::domain::DvrErrorCategory;

    fn request() -> ResourceRequest {
        ResourceRequest {
            job_name: "jki_0000f".to_string(),
            ncores: 10,
            nnodes: 1,
            memory_mb: 10000,
            walltime_hours: 24,
            partition: "short".to_string(),
        }
    }

    #[test]
    fn slurm_script_carries_directives_before_commands() {
        let script = build_job_script(
            JobManagerKind::Slurm,
            &request(),
            &["time ./dvr3drjz.sh".to_string()],
        );
        assert_eq!(
            script,
            "#!/bin/sh\n\n#SBATCH -J jki_0000f\n#SBATCH -c 10\n#SBATCH -N 1\n\
             #SBATCH --mem 10000\n#SBATCH --time=24:00:00\n#SBATCH --partition short\n\
             \nexport OMP_NUM_THREADS=10\n\ntime ./dvr3drjz.sh"
        );
    }

    #[test]
    fn shell_script_has_no_scheduler_directives() {
        let script = build_job_script(
            JobManagerKind::Shell,
            &request(),
            &["echo a".to_string(), "echo b".to_string()],
        );
        assert_eq!(
            script,
            "#!/bin/sh\n\nexport OMP_NUM_THREADS=10\n\necho a\necho b"
        );
    }

    #[test]
    fn sentinels_bracket_the_payload() {
        let commands = wrap_with_sentinels(&["dvr3drjz.sh", "rotlev3b.sh"]);
        assert_eq!(
            commands,
            [
                "rm -f ===DONE===",
                "touch ===RUNNING===",
                "time ./dvr3drjz.sh",
                "time ./rotlev3b.sh",
                "rm -f ===RUNNING===",
                "touch ===DONE===",
            ]
        );
        let job = JobDescriptor::for_starters(JobManagerKind::Shell, request(), &["spectra.sh"]);
        assert!(job.render().ends_with("time ./spectra.sh\nrm -f ===RUNNING===\ntouch ===DONE==="));
    }

    #[test]
    fn job_manager_names_are_case_insensitive() {
        assert_eq!(
            JobManagerKind::parse("SLURM").expect("known manager"),
            JobManagerKind::Slurm
        );
        assert_eq!(
            JobManagerKind::parse("shell").expect("known manager"),
            JobManagerKind::Shell
        );
        let error = JobManagerKind::parse("pbs").expect_err("unknown manager");
        assert_eq!(error.category(), DvrErrorCategory::LookupError);
    }

    #[test]
    fn resource_request_reads_the_calculate_section() {
        let mut params = ParameterSet::new(&POSITIONS_SCHEMA);
        let resources =
            ResourceRequest::from_parameters(&params, "jki_0000f").expect("defaults are valid");
        assert_eq!(resources, request());

        params
            .apply_overrides("CALCULATE.ncores=0")
            .expect("override should apply");
        let error = ResourceRequest::from_parameters(&params, "x").expect_err("zero cores");
        assert_eq!(error.placeholder(), "TYPE.RESOURCE_REQUEST");
    }
}
