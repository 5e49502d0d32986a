use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;
mod session;
mod session_log;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Run(args) => commands::run::execute(args).await,
        cli::Command::Replay(args) => commands::replay::execute(args),
        cli::Command::Methods(args) => commands::methods::execute(args),
        cli::Command::Filters(args) => commands::filters::execute(args),
        cli::Command::Config(args) => commands::config::execute(args),
    };

    std::process::exit(exit_code);
}
