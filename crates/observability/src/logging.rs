//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `PALACE_LOG_LEVEL`: Log-Level oder Filter-Direktive, Standard: info
//! - `PALACE_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Level
pub const ENV_LOG_LEVEL: &str = "PALACE_LOG_LEVEL";
/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "PALACE_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// `level` und `format` kommen aus der Konfiguration und werden durch
/// `PALACE_LOG_LEVEL` / `PALACE_LOG_FORMAT` ueberschrieben.
/// Ein zweiter Aufruf (z.B. in Tests) ist wirkungslos.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_new(log_level_aus_env(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let ergebnis = match log_format_aus_env(format).as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging war bereits initialisiert");
    }
}

/// Log-Level aus der Umgebung, sonst `standard`
pub fn log_level_aus_env(standard: &str) -> String {
    std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| standard.to_string())
}

/// Log-Format aus der Umgebung, sonst `standard`
pub fn log_format_aus_env(standard: &str) -> String {
    std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| standard.to_string())
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
