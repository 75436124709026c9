use std::error::Error;
use std::sync::{Arc, Mutex};

use clap::Parser;
use log::{error, info};
use tipjar::cli::ServerArgs;
use tipjar::database::sqlite::SQLiteConnection;
use tipjar::database::{default_roster, load_roster, seed_employees};
use tipjar::endpoints::{create_http_router, handle};
use tipjar::http::HttpServer;
use tipjar::routes::AppState;
use tipjar::validator::LinkPolicy;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = ServerArgs::parse();

    info!("Opening database {:?}", args.database);
    let mut db = SQLiteConnection::open(&args.database)?;
    let roster = match &args.employees {
        Some(path) => {
            info!("Loading employees from {:?}", path);
            load_roster(path)?
        }
        None => default_roster(),
    };
    seed_employees(&mut db, &roster)?;

    let router = Arc::new(create_http_router()?);
    let state = Arc::new(Mutex::new(AppState::new(
        Box::new(db),
        LinkPolicy::new(args.link_ttl),
    )));

    let server = HttpServer::new(&args.address)?;
    server.serve(args.worker_count(), move |request| {
        // One request at a time touches the state
        let mut state = match state.lock() {
            Ok(state) => state,
            Err(poisoned) => {
                error!("A handler panicked while holding the state");
                poisoned.into_inner()
            }
        };
        handle(&router, &mut state, request)
    });

    Ok(())
}
