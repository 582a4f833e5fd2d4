use anyhow::Result;
use tracing::{debug, error, info, trace};

use super::initdb::run_migrations;
use super::serve::run_server;
use crate::config::{initialize_app_state, Settings};

pub async fn migrate_and_serve(settings: &Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Bind address: {}", settings.bind_address);

    let state = match initialize_app_state(settings).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    run_migrations(&state.db).await?;

    run_server(state, &settings.bind_address).await
}
