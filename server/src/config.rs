//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use palace_observability::logging::{log_format_gueltig, log_level_gueltig};
use palace_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Verbindungs- und Spiel-Einstellungen
    pub spiel: SpielEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Palace Server".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP/WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP/WebSocket
    pub port: u16,
    /// Pfad des WebSocket-Endpunkts
    pub ws_pfad: String,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8080,
            ws_pfad: "/ws".into(),
        }
    }
}

/// Verbindungs- und Spiel-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpielEinstellungen {
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for SpielEinstellungen {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            send_queue_groesse: 64,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// `Ok(None)` wenn die Datei nicht existiert; der Aufrufer entscheidet,
    /// ob er mit Standardwerten weitermacht. Zu dem Zeitpunkt ist das
    /// Logging meist noch nicht initialisiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.validieren()?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde nicht pruefen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.server.max_clients == 0 {
            anyhow::bail!("server.max_clients muss groesser als 0 sein");
        }
        if !self.netzwerk.ws_pfad.starts_with('/') {
            anyhow::bail!(
                "netzwerk.ws_pfad muss mit '/' beginnen: '{}'",
                self.netzwerk.ws_pfad
            );
        }
        if self.spiel.keepalive_sek == 0 || self.spiel.send_queue_groesse == 0 {
            anyhow::bail!("spiel.keepalive_sek und spiel.send_queue_groesse muessen groesser als 0 sein");
        }
        if self.spiel.verbindungs_timeout_sek <= self.spiel.keepalive_sek {
            anyhow::bail!("spiel.verbindungs_timeout_sek muss groesser als spiel.keepalive_sek sein");
        }
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Unbekanntes Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Unbekanntes Log-Format: '{}'", self.logging.format);
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port);
        adresse
            .parse()
            .map_err(|e| anyhow::anyhow!("Ungueltige Bind-Adresse '{adresse}': {e}"))
    }

    /// Einstellungen fuer den Signaling-Service
    pub fn signaling(&self) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            max_clients: self.server.max_clients,
            ws_pfad: self.netzwerk.ws_pfad.clone(),
            keepalive_sek: self.spiel.keepalive_sek,
            verbindungs_timeout_sek: self.spiel.verbindungs_timeout_sek,
            send_queue_groesse: self.spiel.send_queue_groesse,
        }
    }
}
