#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate store_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;
use crate::realtime::Broadcaster;
use crate::store::{DynStore, Store};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod realtime;
pub mod store;
pub mod voting;

pub use config::Config;

/// Build a server backed by MongoDB, configured from `Rocket.toml`.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
}

/// Build a server around an existing store and broadcaster.
pub fn rocket_for_store(store: impl Store, events: Broadcaster, config: Config) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .manage(config)
        .manage(Box::new(store) as DynStore)
        .manage(events)
        .mount("/", api::routes())
}
