//! Sitzungs-Registry
//!
//! Ein Mutex schuetzt die Map `id -> Sitzung`. Jede Sitzung hat zusaetzlich
//! ihren eigenen Mutex. Die beiden Locks werden nie verschachtelt gehalten:
//! erst unter dem Registry-Lock den `Arc` holen, Lock freigeben, dann die
//! Sitzung sperren.

use palace_core::{PalaceError, PlayerId, Result};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::session::{BeitrittErgebnis, GameSession, SessionDescriptor, Teilnehmer};

/// Geteilte, einzeln gesperrte Sitzung
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Registry aller Sitzungen des Prozesses
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Validiert, legt an und speichert eine Sitzung.
    ///
    /// Eine vorhandene Sitzung mit gleicher ID wird stillschweigend ersetzt.
    /// Wer Eindeutigkeit braucht, nimmt `einfuegen_neu`.
    pub fn erstellen(&self, desc: SessionDescriptor) -> Result<SharedSession> {
        // Hashing ausserhalb des Locks
        let sitzung = GameSession::neu(desc)?;
        Ok(self.einfuegen(sitzung))
    }

    /// Speichert eine fertige Sitzung unter ihrer ID
    pub fn einfuegen(&self, sitzung: GameSession) -> SharedSession {
        let id = sitzung.id().to_string();
        let geteilt = Arc::new(Mutex::new(sitzung));

        let ersetzt = self.sessions.lock().insert(id.clone(), Arc::clone(&geteilt));
        if ersetzt.is_some() {
            tracing::debug!(session = %id, "Sitzung mit gleicher ID ersetzt");
        }
        tracing::debug!(session = %id, "Sitzung registriert");
        geteilt
    }

    /// Speichert eine Sitzung nur, wenn ihre ID noch frei ist.
    ///
    /// Pruefen und Einfuegen passieren unter demselben Lock.
    pub fn einfuegen_neu(&self, sitzung: GameSession) -> Result<SharedSession> {
        let id = sitzung.id().to_string();

        let geteilt = match self.sessions.lock().entry(id.clone()) {
            Entry::Occupied(_) => {
                return Err(PalaceError::validierung(format!(
                    "Game '{id}' already exists"
                )))
            }
            Entry::Vacant(frei) => Arc::clone(frei.insert(Arc::new(Mutex::new(sitzung)))),
        };

        tracing::debug!(session = %id, "Sitzung registriert");
        Ok(geteilt)
    }

    pub fn holen(&self, id: &str) -> Option<SharedSession> {
        self.sessions.lock().get(id).cloned()
    }

    /// Wie `holen`, aber mit `NichtGefunden`-Fehler
    pub fn holen_oder_fehler(&self, id: &str) -> Result<SharedSession> {
        self.holen(id)
            .ok_or_else(|| PalaceError::NichtGefunden(format!("game '{id}'")))
    }

    /// Momentaufnahme aller Sitzungen (Reihenfolge unbestimmt)
    pub fn alle(&self) -> Vec<SharedSession> {
        self.sessions.lock().values().cloned().collect()
    }

    /// Entfernt eine Sitzung. Unbekannte IDs sind kein Fehler.
    pub fn entfernen(&self, id: &str) -> Option<SharedSession> {
        let entfernt = self.sessions.lock().remove(id);
        if entfernt.is_some() {
            tracing::debug!(session = %id, "Sitzung entfernt");
        }
        entfernt
    }

    pub fn anzahl(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Tritt einer Sitzung bei (NichtGefunden wenn unbekannt)
    pub fn beitreten(&self, id: &str, teilnehmer: Teilnehmer) -> Result<BeitrittErgebnis> {
        let sitzung = self.holen_oder_fehler(id)?;
        let ergebnis = sitzung.lock().beitreten(teilnehmer);
        Ok(ergebnis)
    }

    /// Entfernt einen Spieler aus allen Sitzungen.
    ///
    /// Gibt die IDs der betroffenen Sitzungen zurueck.
    pub fn spieler_entfernen(&self, spieler: &PlayerId) -> Vec<String> {
        let mut betroffen = Vec::new();
        for sitzung in self.alle() {
            let mut s = sitzung.lock();
            if s.verlassen(spieler) {
                betroffen.push(s.id().to_string());
            }
        }
        betroffen
    }
}
