use anyhow::Context;
use clap::Parser;
use userseed::{config::TargetArgs, store::UserStore};

#[derive(Parser)]
#[command(name = "users_create", version)]
#[command(about = "Create the users table if it does not exist yet")]
struct UsersCreate {
    #[command(flatten)]
    target: TargetArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = UsersCreate::parse();
    let target = args.target.resolve().context("Invalid database configuration")?;
    let mut store = target.open().await.context("Failed to open database")?;

    let result = store.create_and_count_users().await;
    store.close().await;

    let count = result.context("Error creating or counting users")?;
    println!("Table `users` holds {count} rows");

    Ok(())
}
