//! Palace Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use palace_observability::logging_initialisieren;
use palace_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("PALACE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let geladen = ServerConfig::laden(&config_pfad)?;
    let datei_fehlt = geladen.is_none();
    let config = geladen.unwrap_or_default();

    logging_initialisieren(&config.logging.level, &config.logging.format);

    if datei_fehlt {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Palace Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
