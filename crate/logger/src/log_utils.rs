use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_INIT: Once = Once::new();

/// Filter used when neither `RUST_LOG` nor an explicit value is given
const DEFAULT_FILTER: &str = "info,pki_objects=debug,pki_engine_hsm=debug";

/// Install the tracing subscriber, once per process.
///
/// The filter comes from `RUST_LOG` when it is set and valid, then from
/// `default_value`, then from [`DEFAULT_FILTER`]. When another subscriber is
/// already installed, it is left in place.
pub fn log_init(default_value: Option<&str>) {
    LOG_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_value.unwrap_or(DEFAULT_FILTER)));

        let format = tracing_subscriber::fmt::layer()
            .with_level(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .compact();

        if tracing_subscriber::registry()
            .with(filter)
            .with(format)
            .try_init()
            .is_err()
        {
            tracing::debug!("a tracing subscriber is already installed");
        }
    });
}
