//! Build metadata embedded by `build.rs`

use serde::Serialize;

use crate::config::Config;

/// Raw build number as embedded by `build.rs`
pub const BUILD_NUMBER: &str = match option_env!("RATION_BUILD_NUMBER") {
    Some(s) => s,
    None => "0",
};

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("RATION_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build number as an integer; a malformed value counts as build 0
pub fn build_number() -> u64 {
    BUILD_NUMBER.trim().parse().unwrap_or(0)
}

/// Build information for the status tool
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: build_number(),
            build_timestamp: BUILD_TIMESTAMP,
        }
    }

    /// `User-Agent` sent to the planning service
    pub fn user_agent(&self) -> String {
        format!("{}/{}+{}", self.name, self.version, self.build_number)
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner(config: &Config) {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  Ration - adventure ingredient editor");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("  Planning service: {}", config.api_base_url);
    eprintln!("===============================================");
}
