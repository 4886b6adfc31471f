//! dirmirror CLI - directory reports mirrored into list stores

use clap::Parser;

mod cli;
mod commands;
mod context;
mod logger;
mod progress;

use cli::Cli;
use commands::common::ExitCode;
use commands::{init, report};
use dm_sync::PipelineKind;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.global.verbose);

    // Requests are strictly sequential
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match &cli.command {
            cli::Commands::Init(args) => init::execute(args).await,
            cli::Commands::Apps(args) => {
                report::execute(PipelineKind::Apps, args, &cli.global).await
            }
            cli::Commands::Guests(args) => {
                report::execute(PipelineKind::Guests, args, &cli.global).await
            }
            cli::Commands::IntuneApps(args) => {
                report::execute(PipelineKind::IntuneApps, args, &cli.global).await
            }
        }
    });
    drop(runtime);

    if let Err(err) = result {
        if let Some(ExitCode(code)) = err.downcast_ref::<ExitCode>() {
            std::process::exit(*code);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
