//! # Task Server - Entry Point
//! src/main.rs

use task_server::config::Config;
use task_server::error::ServerError;
use task_server::logging;
use task_server::server::{spawn_signal_listener, Server, ShutdownHandle};
use task_server::tasks::TaskManager;
use tracing::error;

fn run() -> Result<(), ServerError> {
    let config = Config::new();
    config.validate()?;
    config.print_summary();

    let manager = TaskManager::from_config(&config);
    let server = Server::bind(&config, manager)?;

    let shutdown = ShutdownHandle::new();
    spawn_signal_listener(shutdown.clone())?;

    server.run(shutdown)
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}
