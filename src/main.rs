use std::sync::Arc;

use campusq::{
    bootstrap,
    config::{Cli, Command, Settings},
    logger,
    model::{AppState, Database},
    poller, routes,
};
use clap::Parser;
use log::{error, info, warn};

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // A missing .env is fine; real env vars and flags still apply.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    logger::init(cli.settings.log_level)?;

    if let Err(err) = dotenv {
        if !err.not_found() {
            warn!("Failed to read .env: {}", err);
        }
    }

    let settings = cli.settings;
    let database = Database::open(&settings.database)?;
    info!("Using database at {}", settings.database.display());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(database, settings).await,
        Command::CreateAdmin { email, password } => {
            let state = AppState::new(database, settings)?;
            let admin = bootstrap::create_admin(&state, &email, &password).await?;
            println!("Admin ready: {} ({})", admin.email, admin.id);
            Ok(())
        }
    }
}

async fn serve(database: Database, settings: Settings) -> Result<(), BoxError> {
    let cors = routes::cors_layer(&settings.cors_origin).map_err(|err| {
        error!("Invalid CORS origin {:?}", settings.cors_origin);
        err
    })?;
    let state = Arc::new(AppState::new(database, settings)?);

    tokio::spawn(poller::run(state.clone()));

    let bind = state.settings.bind;
    let app = routes::router(state).layer(cors);

    info!("Starting campusq server at {}", bind);

    axum::Server::bind(&bind)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
