mod cli;
mod exit_codes;
mod ingest;
mod logging;
mod output;
mod run;
mod run_error;
mod scenarios;
mod watch;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    exit_codes::ExitCode::Success.as_i32()
                }
                _ => exit_codes::ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    logging::init();

    let result = match cli.command {
        cli::Command::Scenarios(args) => {
            scenarios::list(args);
            Ok(exit_codes::ExitCode::Success)
        }
        cli::Command::Run(args) => run::run(args).await,
        cli::Command::Watch(args) => watch::watch(args).await,
        cli::Command::Ingest(args) => ingest::ingest(args).await,
    };

    let code = match result {
        Ok(code) => code.as_i32(),
        Err(err) => {
            eprintln!("{err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}
