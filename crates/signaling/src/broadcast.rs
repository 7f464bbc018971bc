//! Event-Broadcaster – Fan-out an einzelne Spieler, Sitzungen oder alle
//!
//! Jeder Client hat eine begrenzte Send-Queue. Der Broadcaster schreibt
//! nie direkt auf einen Socket, sondern reiht Nachrichten nur ein; der
//! Verbindungs-Task leert die Queue.
//!
//! ## Ablauf
//! 1. Unter dem Lock Empfaenger (Mitglieder, Sender) aufloesen
//! 2. Lock freigeben
//! 3. Einreihen
//!
//! ## Fehlerpolitik
//! Best-effort: jeder Empfaenger wird versucht, Fehler werden in einem
//! `ZustellBericht` gesammelt. Aufraeumen (Abmelden) fehlgeschlagener
//! Empfaenger ist Sache des Aufrufers.

use palace_core::{ConnectionId, PlayerId};
use palace_game::SessionRegistry;
use palace_protocol::ServerMessage;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::error::{SignalingError, SignalingResult};
use crate::players::SpielerRegistry;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Warum eine Nachricht nicht eingereiht werden konnte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendeFehler {
    #[error("Send-Queue voll")]
    QueueVoll,
    #[error("Send-Queue geschlossen")]
    Geschlossen,
}

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    tx: mpsc::Sender<ServerMessage>,
}

impl ClientSender {
    pub fn new(verbindung: ConnectionId, tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { verbindung, tx }
    }

    /// Erstellt Sender und zugehoerige Empfangs-Queue
    pub fn kanal(
        verbindung: ConnectionId,
        groesse: usize,
    ) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(groesse.max(1));
        (Self::new(verbindung, tx), rx)
    }

    /// Reiht eine Nachricht nicht-blockierend ein
    pub fn senden(&self, nachricht: ServerMessage) -> Result<(), SendeFehler> {
        match self.tx.try_send(nachricht) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Nachricht verworfen");
                Err(SendeFehler::QueueVoll)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                Err(SendeFehler::Geschlossen)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ZustellBericht
// ---------------------------------------------------------------------------

/// Ergebnis einer Mehrfachzustellung
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZustellBericht {
    pub zugestellt: usize,
    pub fehlgeschlagen: Vec<PlayerId>,
}

impl ZustellBericht {
    pub fn ist_vollstaendig(&self) -> bool {
        self.fehlgeschlagen.is_empty()
    }

    /// Fuehrt zwei Berichte zusammen
    pub fn zusammenfuehren(&mut self, anderer: ZustellBericht) {
        self.zugestellt += anderer.zugestellt;
        self.fehlgeschlagen.extend(anderer.fehlgeschlagen);
    }

    /// `Zustellung`-Fehler wenn mindestens ein Empfaenger fehlschlug
    pub fn into_result(self) -> SignalingResult<usize> {
        if self.fehlgeschlagen.is_empty() {
            Ok(self.zugestellt)
        } else {
            Err(SignalingError::Zustellung {
                fehlgeschlagen: self.fehlgeschlagen,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Fan-out fuer alle registrierten Spieler
///
/// Clone teilt die darunterliegenden Registries.
#[derive(Clone)]
pub struct EventBroadcaster {
    spieler: Arc<SpielerRegistry>,
    sessions: Arc<SessionRegistry>,
}

impl EventBroadcaster {
    pub fn neu(spieler: Arc<SpielerRegistry>, sessions: Arc<SessionRegistry>) -> Self {
        Self { spieler, sessions }
    }

    /// Sendet an genau einen registrierten Spieler
    pub fn an_spieler_senden(&self, id: &PlayerId, nachricht: ServerMessage) -> SignalingResult<()> {
        let sender = self
            .spieler
            .sender_von(id)
            .ok_or(SignalingError::NichtRegistriert)?;

        sender.senden(nachricht).map_err(|e| {
            tracing::warn!(player_id = %id, fehler = %e, "Unicast fehlgeschlagen");
            SignalingError::Zustellung {
                fehlgeschlagen: vec![*id],
            }
        })
    }

    /// Sendet an ein Mitglied einer Sitzung. Nicht-Mitglieder sind ein Fehler.
    pub fn an_mitglied_senden(
        &self,
        sitzung: &str,
        id: &PlayerId,
        nachricht: ServerMessage,
    ) -> SignalingResult<()> {
        let geteilt = self.sessions.holen_oder_fehler(sitzung)?;
        let mitglied = geteilt.lock().ist_mitglied(id);
        if !mitglied {
            return Err(SignalingError::KeinMitglied {
                spieler: *id,
                sitzung: sitzung.to_string(),
            });
        }
        self.an_spieler_senden(id, nachricht)
    }

    /// Sendet an alle aktuellen Mitglieder einer Sitzung (best-effort)
    pub fn an_sitzung_senden(
        &self,
        sitzung: &str,
        nachricht: ServerMessage,
    ) -> SignalingResult<ZustellBericht> {
        let geteilt = self.sessions.holen_oder_fehler(sitzung)?;
        let mitglieder = geteilt.lock().mitglieder_ids();
        Ok(self.an_gruppe_senden(&mitglieder, nachricht))
    }

    /// Sendet an alle registrierten Spieler (best-effort)
    pub fn an_alle_senden(&self, nachricht: ServerMessage) -> ZustellBericht {
        let empfaenger = self.spieler.alle();
        Self::einreihen(
            empfaenger
                .into_iter()
                .map(|s| (s.id, Some(s.sender), nachricht.clone())),
        )
    }

    /// Sendet jedem Spieler seine eigene Nachricht (z.B. Spielansichten)
    pub fn zustellen(&self, nachrichten: Vec<(PlayerId, ServerMessage)>) -> ZustellBericht {
        let ids: Vec<PlayerId> = nachrichten.iter().map(|(id, _)| *id).collect();
        let sender = self.spieler.sender_fuer(&ids);

        Self::einreihen(
            sender
                .into_iter()
                .zip(nachrichten)
                .map(|((id, s), (_, nachricht))| (id, s, nachricht)),
        )
    }

    /// Sendet an eine bereits aufgeloeste Empfaengerliste (best-effort)
    pub fn an_gruppe_senden(&self, ids: &[PlayerId], nachricht: ServerMessage) -> ZustellBericht {
        let empfaenger = self.spieler.sender_fuer(ids);
        Self::einreihen(
            empfaenger
                .into_iter()
                .map(|(id, s)| (id, s, nachricht.clone())),
        )
    }

    /// Reiht ausserhalb jedes Locks ein und sammelt Fehlschlaege.
    /// Empfaenger ohne Sender (inzwischen abgemeldet) zaehlen als fehlgeschlagen.
    fn einreihen<I>(empfaenger: I) -> ZustellBericht
    where
        I: IntoIterator<Item = (PlayerId, Option<ClientSender>, ServerMessage)>,
    {
        let mut bericht = ZustellBericht::default();
        for (id, sender, nachricht) in empfaenger {
            match sender.map(|s| s.senden(nachricht)) {
                Some(Ok(())) => bericht.zugestellt += 1,
                _ => bericht.fehlgeschlagen.push(id),
            }
        }
        if !bericht.ist_vollstaendig() {
            tracing::warn!(
                zugestellt = bericht.zugestellt,
                fehlgeschlagen = bericht.fehlgeschlagen.len(),
                "Zustellung unvollstaendig"
            );
        }
        bericht
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
