use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::{Args, Parser};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::{
    common::{ConfigError, StoreError},
    loader::BatchPlan,
    pg_store::PgUserStore,
    sqlite_store::SqliteUserStore,
    store::AnyUserStore,
};

#[derive(Debug, Parser)]
#[command(name = "userseed", version)]
#[command(about = "Generate fake users and bulk insert them in batches")]
pub struct Cli {
    #[command(flatten)]
    pub load: LoadArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Clone, Args)]
pub struct LoadArgs {
    /// Number of users to insert.
    #[arg(long, env = "TOTAL_RECORDS", default_value = "10000000")]
    pub total_records: NonZeroUsize,

    /// Users per insert statement.
    #[arg(long, env = "BATCH_SIZE", default_value = "1000")]
    pub batch_size: NonZeroUsize,

    /// Log progress on every Nth batch (and on the last one).
    #[arg(long, env = "PROGRESS_EVERY", default_value = "100")]
    pub progress_every: NonZeroUsize,

    /// Seed for reproducible data.
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,
}

impl LoadArgs {
    #[must_use]
    pub const fn plan(&self) -> BatchPlan {
        BatchPlan::new(self.total_records, self.batch_size)
    }

    #[must_use]
    pub fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }
}

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Load into this SQLite file instead of Postgres.
    #[arg(long, env = "SQLITE_PATH", value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    /// Full Postgres url, takes precedence over the --db-* flags.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_USERNAME")]
    pub db_username: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_NAME", default_value = "test")]
    pub db_name: String,

    /// disable, allow, prefer, require, verify-ca or verify-full.
    #[arg(long, env = "DB_SSLMODE", default_value = "prefer")]
    pub db_sslmode: String,
}

#[derive(Debug, Clone)]
pub enum Target {
    Postgres(PgConnectOptions),
    Sqlite(PathBuf),
}

impl TargetArgs {
    /// # Errors
    ///
    /// On a malformed url, unknown ssl mode or missing username.
    pub fn resolve(&self) -> Result<Target, ConfigError> {
        if let Some(path) = &self.sqlite {
            return Ok(Target::Sqlite(path.clone()));
        }

        if let Some(url) = &self.database_url {
            let options =
                PgConnectOptions::from_str(url).map_err(ConfigError::InvalidDatabaseUrl)?;
            return Ok(Target::Postgres(options));
        }

        let username = self
            .db_username
            .as_deref()
            .ok_or(ConfigError::MissingUsername)?;
        let ssl_mode = PgSslMode::from_str(&self.db_sslmode)
            .map_err(|_| ConfigError::InvalidSslMode(self.db_sslmode.clone()))?;

        let mut options = PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(username)
            .ssl_mode(ssl_mode);
        if let Some(password) = &self.db_password {
            options = options.password(password);
        }

        Ok(Target::Postgres(options))
    }
}

impl Target {
    /// # Errors
    ///
    /// When the database cannot be reached or opened.
    pub async fn open(self) -> Result<AnyUserStore, StoreError> {
        match self {
            Self::Postgres(options) => {
                info!(
                    "Connecting to postgres at {}:{}/{}",
                    options.get_host(),
                    options.get_port(),
                    options.get_database().unwrap_or_default()
                );
                Ok(AnyUserStore::Postgres(PgUserStore::connect(options).await?))
            }
            Self::Sqlite(path) => {
                info!("Opening sqlite database {}", path.display());
                Ok(AnyUserStore::Sqlite(SqliteUserStore::open(path)?))
            }
        }
    }
}
