//! Build script for Ration
//!
//! Bumps a persistent build counter whenever sources change and embeds it,
//! together with the build time, as compile-time environment variables.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter_path = Path::new(COUNTER_FILE);
    let build_number = read_counter(counter_path) + 1;
    if let Err(e) = fs::write(counter_path, build_number.to_string()) {
        // Read-only checkouts still build, just without a persistent counter
        println!("cargo:warning=Could not persist build number: {}", e);
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");

    println!("cargo:rustc-env=RATION_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=RATION_BUILD_TIMESTAMP={}", timestamp);
}
