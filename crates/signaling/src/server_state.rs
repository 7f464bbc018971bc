//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registries, Fan-out und Regelwerk als Arc-Referenzen, die sicher
//! zwischen tokio-Tasks geteilt werden koennen. Der Zustand wird einmal
//! beim Start gebaut und explizit an Router und Dispatcher uebergeben.

use palace_game::{NurZugreihenfolge, Regelwerk, SessionRegistry};
use palace_observability::{HealthQuelle, HealthStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::EventBroadcaster;
use crate::players::SpielerRegistry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: usize,
    /// Pfad des WebSocket-Endpunkts
    pub ws_pfad: String,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Palace Server".to_string(),
            max_clients: 512,
            ws_pfad: "/ws".to_string(),
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            send_queue_groesse: 64,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Verbindung -> Spieler
    pub spieler: Arc<SpielerRegistry>,
    /// Sitzungs-ID -> Sitzung
    pub sessions: Arc<SessionRegistry>,
    /// Fan-out an Spieler und Sitzungen
    pub broadcaster: EventBroadcaster,
    /// Prueft Spielaktionen
    pub regeln: Arc<dyn Regelwerk>,
    /// Offene WebSocket-Verbindungen
    verbindungen: AtomicUsize,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState mit dem Standard-Regelwerk
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        Self::mit_regeln(config, Arc::new(NurZugreihenfolge))
    }

    /// Erstellt einen neuen SignalingState mit eigenem Regelwerk
    pub fn mit_regeln(config: SignalingConfig, regeln: Arc<dyn Regelwerk>) -> Arc<Self> {
        let spieler = Arc::new(SpielerRegistry::neu());
        let sessions = Arc::new(SessionRegistry::neu());
        let broadcaster = EventBroadcaster::neu(Arc::clone(&spieler), Arc::clone(&sessions));

        Arc::new(Self {
            config: Arc::new(config),
            spieler,
            sessions,
            broadcaster,
            regeln,
            verbindungen: AtomicUsize::new(0),
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Reserviert einen Verbindungsplatz. `false` wenn der Server voll ist.
    pub fn verbindung_reservieren(&self) -> bool {
        let max = self.config.max_clients;
        self.verbindungen
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }

    /// Gibt einen Verbindungsplatz frei
    pub fn verbindung_freigeben(&self) {
        let _ = self
            .verbindungen
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    pub fn verbindungen(&self) -> usize {
        self.verbindungen.load(Ordering::Acquire)
    }

    /// Wie `verbindung_reservieren`, gibt den Platz aber beim Drop frei
    pub fn platz_reservieren(self: &Arc<Self>) -> Option<VerbindungsPlatz> {
        self.verbindung_reservieren().then(|| VerbindungsPlatz {
            state: Arc::clone(self),
        })
    }
}

/// Reservierter Verbindungsplatz, wird beim Drop freigegeben
pub struct VerbindungsPlatz {
    state: Arc<SignalingState>,
}

impl Drop for VerbindungsPlatz {
    fn drop(&mut self) {
        self.state.verbindung_freigeben();
    }
}

impl HealthQuelle for SignalingState {
    fn uptime_sekunden(&self) -> u64 {
        self.uptime_sek()
    }

    fn sitzungen(&self) -> usize {
        self.sessions.anzahl()
    }

    fn spieler(&self) -> usize {
        self.spieler.anzahl()
    }

    /// Voller Server gilt als degraded
    fn status(&self) -> HealthStatus {
        if self.verbindungen() >= self.config.max_clients {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
