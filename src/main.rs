use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;
use userseed::{
    config::Cli,
    loader::BatchLoader,
    store::UserStore,
    synth::UserSynthesizer,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error in data generation: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let target = cli.target.resolve().context("Invalid database configuration")?;
    let mut store = target.open().await.context("Failed to open database")?;

    let result = BatchLoader::new(
        &mut store,
        UserSynthesizer::new(cli.load.rng()),
        cli.load.plan(),
    )
    .with_progress_every(cli.load.progress_every)
    .call()
    .await;

    // Released on both paths, before the error is reported.
    store.close().await;

    result?;
    Ok(())
}
