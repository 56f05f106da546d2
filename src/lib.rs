#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

pub mod common;
pub mod config;
pub mod loader;
pub mod pg_store;
pub mod record;
pub mod schema;
pub mod sqlite_store;
pub mod store;
pub mod synth;
