use log::{error, info, LevelFilter};
use rocket::Error as RocketError;
use thiserror::Error;

const LOG_CONFIG: &str = "log4rs.yaml";

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
enum Error {
    #[error("Failed to initialise logging from {LOG_CONFIG}: {0}")]
    Logging(String),
    #[error(transparent)]
    Rocket(#[from] RocketError),
}

fn init_logging() -> Result<(), Error> {
    log4rs::init_file(LOG_CONFIG, log4rs_dynamic_filters::default_deserializers())
        .map_err(|err| Error::Logging(err.to_string()))
}

async fn serve() -> Result<(), Error> {
    let rocket = votes_backend::build().ignite().await?;
    info!("Server configured, launching...");
    // The logger fairing reports everything from here on.
    log4rs_dynamic_filters::DynamicLevelFilter::set("rocket", LevelFilter::Off);
    rocket.launch().await?;
    info!("Server stopped");
    Ok(())
}

#[rocket::main]
async fn main() {
    if let Err(err) = init_logging() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    if let Err(err) = serve().await {
        error!("{err}");
        error!("Critical failure, shutting down");
        std::process::exit(1)
    }
}
