// src/client/main.rs

use std::process::ExitCode;
use std::str::FromStr;

use licensegate::config::init_config;
use licensegate::errors::VerifyResult;
use licensegate::LicenseGate;
use tracing::Level;

const USAGE: &str = "usage: licensegate_cli <LICENSE_KEY> [SCOPE] [METADATA]";

/// Command-line license check.
///
/// Reads account id, server and key settings from `config.toml` and
/// `LICENSEGATE_*` environment variables, verifies the given key once and
/// prints the outcome.
///
/// Exit status: 0 when the license is valid, 1 for any other outcome,
/// 2 for usage or configuration errors.
#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(license_key) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let gate = match build_gate() {
        Ok(gate) => gate,
        Err(e) => {
            eprintln!("licensegate_cli: {e}");
            return ExitCode::from(2);
        }
    };

    let scope = args.get(1).map(String::as_str);
    let metadata = args.get(2).map(String::as_str);

    let outcome = gate.verify(license_key, scope, metadata).await;
    println!("{outcome}");

    if outcome.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn build_gate() -> VerifyResult<LicenseGate> {
    let config = init_config()?;

    if config.logging.enabled {
        // validate() has already checked the level name.
        let level = Level::from_str(&config.logging.level).unwrap_or(Level::INFO);
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    LicenseGate::from_config(&config.client)
}
