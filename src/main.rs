use std::sync::Arc;

use log::{error, info};
use tokio::{
    io::{stdin, stdout, BufReader},
    sync::Mutex,
};

mod allocator;
mod config;
mod currency;
mod dashboard;
mod database;
mod endpoints;
mod error;
mod formatter;
mod parser;
mod rate;
mod settlement;
mod shell;
mod types;
mod validator;

use crate::config::Config;
use crate::database::sqlite::SqliteDatabase;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = Config::from_env()
        .map_err(|e| error!("Cannot load configuration: {e:#}"))
        .expect("Cannot load configuration");

    info!("Initializing database at {}...", config.database_path.display());
    let database = SqliteDatabase::new(&config.database_path)
        .map_err(|e| error!("Cannot initialize database: {}", e))
        .expect("Cannot initialize database");

    let database = Arc::new(Mutex::new(database));

    info!("Starting shell...");

    if let Err(e) = shell::run(database, &config, BufReader::new(stdin()), stdout()).await {
        error!("{e:?}");
        eprintln!("{}", e.user_message());
    }
}
