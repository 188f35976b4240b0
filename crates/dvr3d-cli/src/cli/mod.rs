mod commands;
mod helpers;

use clap::Parser;
use dvr3d_core::domain::DvrError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let dvr_error = error.as_dvr_error();
            eprintln!("{}", dvr_error.diagnostic_line());
            if let Some(summary_line) = dvr_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            dvr_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("dvr3d".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "dvr3d", about = "Project driver for the DVR3D program suite", version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Rovibrational energy levels: one unit per (J, kmin, ipar) block
    Positions(commands::PositionsArgs),
    /// Line intensities: one unit per bra/ket transition
    Intensities(commands::IntensitiesArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Positions(args) => commands::run_positions_command(args),
        CliCommand::Intensities(args) => commands::run_intensities_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Pipeline(#[from] DvrError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_dvr_error(&self) -> DvrError {
        match self {
            Self::Usage(message) => DvrError::format("FORMAT.CLI_USAGE", message.trim_end()),
            Self::Pipeline(error) => error.clone(),
            Self::Internal(error) => DvrError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
