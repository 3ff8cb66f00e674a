#![warn(missing_docs)]
//! # qcm-resolver-app binary
//!
//! Desktop entry point: initializes logging, resolves configuration, and
//! reports the probed capture capability.

use qcm_resolver_app::{app_version, AppConfig};
use qcm_resolver_capture::{probe_still_strategy, RealScreenSource};
use qcm_resolver_i18n::{translate, Language, MessageKey};

/// CLI entry point.
fn main() {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("qcm-resolver configuration error: {error}");
            std::process::exit(1);
        }
    };

    println!("qcm-resolver {}", app_version());
    println!("api_base={}", config.api_base);
    println!("capture_interval_ms={}", config.capture_interval_ms);

    match RealScreenSource::discover() {
        Ok(source) => {
            let strategy = probe_still_strategy(&source);
            println!("capture=ready still_strategy={strategy:?}");
        }
        Err(error) => {
            println!(
                "{} ({error})",
                translate(Language::En, MessageKey::CaptureNotSupported)
            );
        }
    }
}
