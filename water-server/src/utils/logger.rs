//! Logging Infrastructure
//!
//! Console output always; with a log directory, daily rotating files:
//! - `app/`      application logs
//! - `security/` events logged under the `security` target

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Default filter when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("water_server={level},tower_http={level},security=info")
}

/// Initialize the logging system
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logger(level: &str, log_dir: Option<&str>) -> std::io::Result<()> {
    let filter = default_filter(level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let Some(dir) = log_dir else {
        subscriber.with(console_layer).init();
        return Ok(());
    };

    let log_dir = Path::new(dir);
    let app_log_dir = log_dir.join("app");
    let security_log_dir = log_dir.join("security");
    fs::create_dir_all(&app_log_dir)?;
    fs::create_dir_all(&security_log_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let app_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != "security"
        }));

    let security_log = RollingFileAppender::new(Rotation::DAILY, security_log_dir, "security");
    let security_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::sync::Mutex::new(security_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == "security"
        }));

    subscriber
        .with(console_layer)
        .with(app_layer)
        .with(security_layer)
        .init();

    tracing::info!(dir = %log_dir.display(), "File logging enabled");
    Ok(())
}
