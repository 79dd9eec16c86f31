use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Herbora";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> &'static str {
    "herbora=info"
}

/// Get the application data directory
/// ~/Herbora/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Herbora")
}

/// Get the catalogue directory (one JSON file per product sheet)
pub fn catalogue_dir() -> PathBuf {
    app_data_dir().join("catalogue")
}

/// Get the SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("herbora.db")
}
