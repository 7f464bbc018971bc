//! Handler fuer alle Control-Nachrichten
//!
//! Jeder Handler ist fuer eine Gruppe von Nachrichtenarten zustaendig und
//! hat Zugriff auf den gemeinsamen SignalingState. Antworten an den
//! Aufrufer reiht der Handler selbst ueber den `DispatcherContext` ein,
//! bevor er an andere verteilt. Zurueck gibt er den `ZustellBericht` der
//! Verteilung, damit der Dispatcher fehlgeschlagene Empfaenger abmelden kann.

pub mod lobby_handler;
pub mod spiel_handler;
pub mod spieler_handler;

use serde::de::DeserializeOwned;

use crate::dispatcher::DispatcherContext;
use crate::error::{SignalingError, SignalingResult};
use crate::players::Spieler;
use crate::server_state::SignalingState;

/// Dekodiert den String-Inhalt eines Umschlags
pub(crate) fn inhalt_parsen<T: DeserializeOwned>(content: &str) -> SignalingResult<T> {
    serde_json::from_str(content)
        .map_err(|e| SignalingError::protokoll(format!("invalid request content: {e}")))
}

/// Registrierter Spieler der aktuellen Verbindung
pub(crate) fn registriert(
    ctx: &DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<Spieler> {
    state
        .spieler
        .nachschlagen(&ctx.verbindung)
        .ok_or(SignalingError::NichtRegistriert)
}

/// Fuehrt teure, blockierende Arbeit (Passwort-Hashing) ausserhalb des
/// async-Executors und ausserhalb aller Locks aus
pub(crate) async fn blockierend<T, F>(f: F) -> SignalingResult<T>
where
    F: FnOnce() -> palace_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SignalingError::intern(format!("blocking task failed: {e}")))?
        .map_err(SignalingError::from)
}
