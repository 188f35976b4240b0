mod cli;

use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("DVR3D_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();

    std::process::exit(cli::run_from_env());
}
