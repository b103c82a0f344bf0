//! Tracing subscriber setup
//!
//! The subscriber is installed before configuration is read so config
//! diagnostics are not lost. The configured level is applied afterwards
//! through a reload handle.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Handle for swapping the active filter once config is known
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Level used until the config file has been read
pub const STARTUP_LEVEL: &str = "info";

/// Filter directives for the gateway crates at `level`
pub fn default_directives(level: &str) -> String {
    format!("pulse_gateway={0},pulse_common={0},tower_http=info", level)
}

/// Install the global subscriber
///
/// RUST_LOG wins when set and no handle is returned, since the config level
/// must not override it.
pub fn init() -> Option<FilterHandle> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
        Err(_) => {
            let (filter, handle) =
                reload::Layer::new(EnvFilter::new(default_directives(STARTUP_LEVEL)));
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            Some(handle)
        }
    }
}

/// Switch the running filter to the configured level
pub fn apply_level(handle: &FilterHandle, level: &str) -> Result<(), reload::Error> {
    handle.reload(EnvFilter::new(default_directives(level)))
}
