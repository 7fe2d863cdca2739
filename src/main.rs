mod access_log;
mod cli;
mod config;
mod controller;
mod logging;
mod request;
mod server;
mod service;
mod version_info;

use clap::Parser;

use tracing::error;

async fn try_main(args: cli::Args) -> anyhow::Result<()> {
    let loaded_configuration = config::load(&args).await?;

    let _log_guard = logging::init(&loaded_configuration.configuration.log_file, args.debug)?;

    version_info::log_startup();
    loaded_configuration.log_summary();

    let result = server::run(&loaded_configuration.configuration.web).await;

    if let Err(err) = &result {
        error!("fatal error in main:\n{:#}", err);
    }

    result
}

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    if args.version {
        print!("{}", version_info::version_text());
        return;
    }

    if let Err(err) = try_main(args).await {
        eprintln!("fatal error in main:\n{:#}", err);
        std::process::exit(1);
    }
}
