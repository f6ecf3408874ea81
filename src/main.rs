use std::process::ExitCode;
use clap::Parser as ClapParser;
use lox_walk::{Config, Error};

fn main() -> ExitCode {
    let config: Config = Config::parse();
    logging::enable(config.verbose);

    match lox_walk::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported by the diagnostics
        Err(Error::Failed) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        },
    }
}

mod logging {
    use tracing::Level;

    pub fn enable(verbose: bool) {
        let level = if verbose { Level::TRACE } else { Level::WARN };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
