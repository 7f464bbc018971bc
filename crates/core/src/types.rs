//! Identifikationstypen fuer Palace
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Spieler- und Verbindungs-IDs zur Compilezeit auszuschliessen.
//! Spieler werden ueberall ueber ihre `PlayerId` referenziert, nie ueber
//! die Verbindung selbst.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Spieler-ID, wird einmal pro Verbindung vergeben
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Erstellt eine neue zufaellige PlayerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Identitaet einer Transportverbindung (eine WebSocket-Verbindung)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_eindeutig() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        assert_ne!(a, b, "Zwei neue PlayerIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let pid = PlayerId::new();
        let json = serde_json::to_string(&pid).unwrap();
        let pid2: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(pid, pid2);
    }
}
