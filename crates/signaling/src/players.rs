//! Spieler-Registry – Welche Verbindung gehoert zu welchem Spieler
//!
//! Bildet eine Transportverbindung (`ConnectionId`) auf einen registrierten
//! Spieler ab. Die `PlayerId` wird einmal pro Verbindung vergeben und ist
//! der Schluessel fuer alles andere (Sitzungen, Fan-out).
//!
//! Ein einziger Mutex schuetzt beide Maps. Die kritischen Abschnitte sind
//! reine Map-Operationen, gesendet wird nie unter dem Lock.

use palace_core::{ConnectionId, PlayerId};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::broadcast::ClientSender;
use crate::error::{SignalingError, SignalingResult};

/// Ein registrierter Spieler
#[derive(Debug, Clone)]
pub struct Spieler {
    pub id: PlayerId,
    pub name: String,
    pub sender: ClientSender,
}

impl Spieler {
    pub fn verbindung(&self) -> ConnectionId {
        self.sender.verbindung
    }
}

#[derive(Default)]
struct Inner {
    nach_verbindung: HashMap<ConnectionId, Spieler>,
    verbindung_von: HashMap<PlayerId, ConnectionId>,
}

impl Inner {
    fn eintragen(&mut self, verbindung: ConnectionId, name: String, sender: ClientSender) -> Spieler {
        // Erneute Registrierung derselben Verbindung behaelt die Identitaet
        let id = self
            .nach_verbindung
            .get(&verbindung)
            .map(|s| s.id)
            .unwrap_or_default();

        let spieler = Spieler { id, name, sender };
        self.nach_verbindung.insert(verbindung, spieler.clone());
        self.verbindung_von.insert(id, verbindung);
        spieler
    }
}

/// Registry aller registrierten Spieler
#[derive(Default)]
pub struct SpielerRegistry {
    inner: Mutex<Inner>,
}

impl SpielerRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert (oder aktualisiert) den Spieler einer Verbindung.
    ///
    /// Die Verbindung ist der Schluessel: eine zweite Registrierung
    /// ueberschreibt Name und Sender, die `PlayerId` bleibt erhalten.
    pub fn registrieren(
        &self,
        verbindung: ConnectionId,
        name: impl Into<String>,
        sender: ClientSender,
    ) -> Spieler {
        let spieler = self.inner.lock().eintragen(verbindung, name.into(), sender);
        tracing::debug!(player_id = %spieler.id, verbindung = %verbindung, "Spieler eingetragen");
        spieler
    }

    /// Wie `registrieren`, lehnt aber Namen ab, die eine andere Verbindung
    /// bereits benutzt. Pruefung und Eintrag passieren unter demselben Lock.
    pub fn registrieren_eindeutig(
        &self,
        verbindung: ConnectionId,
        name: &str,
        sender: ClientSender,
    ) -> SignalingResult<Spieler> {
        let mut inner = self.inner.lock();

        let vergeben = inner
            .nach_verbindung
            .iter()
            .any(|(v, s)| *v != verbindung && s.name == name);
        if vergeben {
            return Err(SignalingError::NameVergeben(name.to_string()));
        }

        Ok(inner.eintragen(verbindung, name.to_string(), sender))
    }

    pub fn nachschlagen(&self, verbindung: &ConnectionId) -> Option<Spieler> {
        self.inner.lock().nach_verbindung.get(verbindung).cloned()
    }

    /// Spieler anhand seiner ID
    pub fn spieler(&self, id: &PlayerId) -> Option<Spieler> {
        let inner = self.inner.lock();
        inner
            .verbindung_von
            .get(id)
            .and_then(|v| inner.nach_verbindung.get(v))
            .cloned()
    }

    /// Entfernt die Zuordnung. Unbekannte Verbindungen sind kein Fehler.
    pub fn abmelden(&self, verbindung: &ConnectionId) -> Option<Spieler> {
        let mut inner = self.inner.lock();
        let spieler = inner.nach_verbindung.remove(verbindung)?;
        inner.verbindung_von.remove(&spieler.id);
        Some(spieler)
    }

    /// Entfernt einen Spieler anhand seiner ID
    pub fn abmelden_spieler(&self, id: &PlayerId) -> Option<Spieler> {
        let verbindung = self.inner.lock().verbindung_von.get(id).copied()?;
        self.abmelden(&verbindung)
    }

    /// Momentaufnahme aller Spieler
    pub fn alle(&self) -> Vec<Spieler> {
        self.inner.lock().nach_verbindung.values().cloned().collect()
    }

    /// Sender eines Spielers
    pub fn sender_von(&self, id: &PlayerId) -> Option<ClientSender> {
        self.spieler(id).map(|s| s.sender)
    }

    /// Sender mehrerer Spieler in einem Lock-Durchgang.
    /// Unbekannte Spieler liefern `None`.
    pub fn sender_fuer(&self, ids: &[PlayerId]) -> Vec<(PlayerId, Option<ClientSender>)> {
        let inner = self.inner.lock();
        ids.iter()
            .map(|id| {
                let sender = inner
                    .verbindung_von
                    .get(id)
                    .and_then(|v| inner.nach_verbindung.get(v))
                    .map(|s| s.sender.clone());
                (*id, sender)
            })
            .collect()
    }

    pub fn anzahl(&self) -> usize {
        self.inner.lock().nach_verbindung.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
