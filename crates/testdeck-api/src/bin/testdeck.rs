// testdeck-api/src/bin/testdeck.rs
// ============================================================================
// Module: Testdeck Server Binary
// Description: Entry point running the Testdeck HTTP service.
// Purpose: Load configuration, open the store, and serve until shutdown.
// Dependencies: testdeck-api, testdeck-config, tokio
// ============================================================================

//! Testdeck server entry point. Takes one optional argument: the path to a
//! `testdeck.toml` configuration file.

use std::error::Error;
use std::path::Path;

use testdeck_config::TestdeckConfig;

/// Loads configuration and runs the service.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "testdeck.toml".to_string());
    let config = TestdeckConfig::load(Path::new(&path))?;
    testdeck_api::serve(config).await?;
    Ok(())
}
