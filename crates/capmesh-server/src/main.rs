// crates/capmesh-server/src/main.rs
// ============================================================================
// Module: main
// Description: Router process entry point.
// Purpose: Load the configuration, restore persisted state, and serve the
//          HTTP surface until the process is stopped.
// Dependencies: capmesh-server, tokio
// ============================================================================

//! ## Overview
//! The binary takes one optional argument, the configuration file path,
//! defaulting to `router.toml` in the working directory. A missing file
//! yields the built-in defaults (in-memory store on port 8080).

use std::env;
use std::fs;
use std::sync::Arc;

use capmesh_server::NoopRouterMetrics;
use capmesh_server::RouterConfig;
use capmesh_server::ServerError;
use capmesh_server::build_state;
use capmesh_server::serve;

/// Loads the configuration named on the command line, or defaults.
fn load_config() -> Result<RouterConfig, ServerError> {
    let path = env::args().nth(1).unwrap_or_else(|| "router.toml".to_string());
    match fs::read_to_string(&path) {
        Ok(raw) => Ok(RouterConfig::from_toml_str(&raw)?),
        Err(_) => Ok(RouterConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = load_config()?;
    let state = build_state(&config, Arc::new(NoopRouterMetrics)).await?;
    serve(&config, state).await
}
