//! palace-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use palace_signaling::{SignalingServer, SignalingState};
use std::sync::Arc;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    state: Arc<SignalingState>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration.
    /// Der gemeinsame Zustand wird hier einmal gebaut und danach nur noch
    /// weitergereicht.
    pub fn neu(config: ServerConfig) -> Self {
        let state = SignalingState::neu(config.signaling());
        Self { config, state }
    }

    pub fn state(&self) -> &Arc<SignalingState> {
        &self.state
    }

    /// Startet den Server und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen"),
            }
            let _ = shutdown_tx.send(true);
        });

        self.starten_bis(shutdown_rx).await
    }

    /// Startet den Server und laeuft bis `shutdown_rx` `true` meldet
    pub async fn starten_bis(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let bind_addr = self.config.bind_adresse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %bind_addr,
            ws_pfad = %self.config.netzwerk.ws_pfad,
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        SignalingServer::neu(Arc::clone(&self.state), bind_addr)
            .starten(shutdown_rx)
            .await?;

        tracing::info!(
            uptime_sek = self.state.uptime_sek(),
            "Server beendet"
        );
        Ok(())
    }
}
