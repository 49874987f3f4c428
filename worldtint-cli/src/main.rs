//! Worldtint CLI - batch entry point.
//!
//! Reads provider credentials from the environment, wires the real
//! collaborators together and runs the world batch once. Output file
//! and resolution are fixed configuration, not flags.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use worldtint::fetch::{TileFetcher, ThreadSleeper};
use worldtint::processor::{ProcessorConfig, WorldProcessor, DEFAULT_RESOLUTION_KM};
use worldtint::provider::{CdseAuthenticator, ReqwestClient, SentinelProvider};
use worldtint::telemetry;

/// Environment variable holding the OAuth client id.
const CLIENT_ID_VAR: &str = "CDSE_CLIENT_ID";

/// Environment variable holding the OAuth client secret.
const CLIENT_SECRET_VAR: &str = "CDSE_CLIENT_SECRET";

/// Fixed output location for the generated dataset.
const OUTPUT_FILE: &str = "world_satellite_colors.json";

fn main() -> ExitCode {
    telemetry::init();

    let (client_id, client_secret) = match credentials() {
        Some(credentials) => credentials,
        None => {
            error!(
                "{} and {} must be set; register at https://dataspace.copernicus.eu/ \
                 and create OAuth client credentials",
                CLIENT_ID_VAR, CLIENT_SECRET_VAR
            );
            return ExitCode::FAILURE;
        }
    };

    let http_client = match ReqwestClient::new() {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "could not construct HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let authenticator = CdseAuthenticator::new(http_client.clone(), client_id, client_secret);
    let fetcher = TileFetcher::new(SentinelProvider::new(http_client));
    let config = ProcessorConfig::new(DEFAULT_RESOLUTION_KM);
    let processor = WorldProcessor::new(authenticator, fetcher, ThreadSleeper, config);

    match processor.run(Path::new(OUTPUT_FILE)) {
        Ok(dataset) => {
            info!(
                tiles = dataset.len(),
                output = OUTPUT_FILE,
                "conversion completed"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "processing failed");
            ExitCode::FAILURE
        }
    }
}

/// Both credentials from the environment, or `None` if either is
/// missing or empty.
fn credentials() -> Option<(String, String)> {
    let id = env::var(CLIENT_ID_VAR).ok().filter(|v| !v.is_empty())?;
    let secret = env::var(CLIENT_SECRET_VAR).ok().filter(|v| !v.is_empty())?;
    Some((id, secret))
}
