//! Fehlertypen fuer Palace
//!
//! Zentraler Fehler-Enum fuer Karten, Turn-Engine und Sitzungen.
//! Die Meldungen gehen unveraendert an Clients, daher englisch.
//! Kein Fehler ist fatal fuer den Prozess – jeder Fehler betrifft genau
//! eine Anfrage oder eine Verbindung.

use thiserror::Error;

/// Globaler Result-Alias fuer Palace
pub type Result<T> = std::result::Result<T, PalaceError>;

/// Domaenenfehler (Validierung, Kapazitaet, Nicht gefunden, Regeln)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PalaceError {
    // --- Validierung (vor jeder Zustandsaenderung) ---
    #[error("Invalid input: {0}")]
    Validierung(String),

    // --- Kapazitaet ---
    #[error("Game is full")]
    SitzungVoll,

    // --- Ressourcen ---
    #[error("Not found: {0}")]
    NichtGefunden(String),

    // --- Spielregeln ---
    #[error("Not your turn")]
    NichtAmZug,

    #[error("Illegal action: {0}")]
    UngueltigeAktion(String),

    // --- Passwort ---
    #[error("Password hashing failed: {0}")]
    PasswortHashing(String),

    // --- Intern ---
    #[error("Internal error: {0}")]
    Intern(String),
}

impl PalaceError {
    /// Erstellt einen Validierungsfehler
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn es sich um einen erwartbaren, nicht-fatalen
    /// Ausgang handelt (z.B. volles Spiel)
    pub fn ist_erwartbar(&self) -> bool {
        matches!(self, Self::SitzungVoll | Self::NichtAmZug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = PalaceError::validierung("name missing");
        assert_eq!(e.to_string(), "Invalid input: name missing");
    }

    #[test]
    fn voll_ist_erwartbar() {
        assert!(PalaceError::SitzungVoll.ist_erwartbar());
        assert!(!PalaceError::intern("kaputt").ist_erwartbar());
    }
}
