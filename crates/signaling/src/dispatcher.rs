//! Message-Dispatcher – Routet Client-Nachrichten an die richtigen Handler
//!
//! Der Dispatcher empfaengt Umschlaege von einer `ClientConnection`,
//! bestimmt anhand von `type` den Handler und reiht Fehlerantworten selbst
//! in die Queue der Verbindung ein.
//!
//! ## Fehlgeschlagene Zustellungen
//! Handler verteilen best-effort und melden fehlgeschlagene Empfaenger im
//! `ZustellBericht`. Der Dispatcher meldet diese Spieler danach ab.

use palace_core::{ConnectionId, PlayerId};
use palace_protocol::{ClientMessage, ErrorCode, MessageKind, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::broadcast::{ClientSender, ZustellBericht};
use crate::error::SignalingResult;
use crate::handlers::{lobby_handler, spiel_handler, spieler_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Peer-Adresse fuer Logs
    pub peer_addr: SocketAddr,
    /// Transport-Identitaet dieser Verbindung
    pub verbindung: ConnectionId,
    /// Eigene Send-Queue
    pub sender: ClientSender,
    /// Registrierter Spieler (None vor `register` und nach `unregister`)
    pub spieler_id: Option<PlayerId>,
}

impl DispatcherContext {
    pub fn neu(peer_addr: SocketAddr, sender: ClientSender) -> Self {
        Self {
            peer_addr,
            verbindung: sender.verbindung,
            sender,
            spieler_id: None,
        }
    }

    /// Antwort an den Aufrufer einreihen
    pub fn antworten(&self, nachricht: ServerMessage) {
        if let Err(e) = self.sender.senden(nachricht) {
            tracing::warn!(peer = %self.peer_addr, fehler = %e, "Antwort nicht zustellbar");
        }
    }
}

/// Ergebnis einer Verarbeitung (fuer Logs und Tests)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErgebnis {
    Erfolg,
    Abgelehnt(ErrorCode),
    UnbekannterTyp,
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet einen eingehenden Umschlag. Jede Anfrage bekommt eine
    /// Antwort, auch unbekannte und fehlerhafte.
    pub async fn dispatch(
        &self,
        nachricht: ClientMessage,
        ctx: &mut DispatcherContext,
    ) -> DispatchErgebnis {
        let Some(art) = nachricht.kind() else {
            tracing::warn!(peer = %ctx.peer_addr, typ = %nachricht.art, "Unbekannter Nachrichtentyp");
            ctx.antworten(ServerMessage::error(
                ErrorCode::UnknownType,
                "Unknown message type",
            ));
            return DispatchErgebnis::UnbekannterTyp;
        };

        tracing::trace!(peer = %ctx.peer_addr, typ = art.als_str(), "Nachricht empfangen");

        let content = nachricht.content.as_str();
        let state = self.state.as_ref();

        let ergebnis: SignalingResult<ZustellBericht> = match art {
            // -------------------------------------------------------------------
            // Spieler
            // -------------------------------------------------------------------
            MessageKind::Register => spieler_handler::handle_register(content, ctx, state),
            MessageKind::Unregister => spieler_handler::handle_unregister(ctx, state),

            // -------------------------------------------------------------------
            // Lobby
            // -------------------------------------------------------------------
            MessageKind::CreateGame => {
                lobby_handler::handle_create_game(content, ctx, state).await
            }
            MessageKind::JoinGame => lobby_handler::handle_join_game(content, ctx, state).await,
            MessageKind::LeaveGame => lobby_handler::handle_leave_game(content, ctx, state),
            MessageKind::AllGames => lobby_handler::handle_all_games(ctx, state),

            // -------------------------------------------------------------------
            // Spiel
            // -------------------------------------------------------------------
            MessageKind::StartGame => spiel_handler::handle_start_game(content, ctx, state),
            MessageKind::PlayCard => spiel_handler::handle_play_card(content, ctx, state),
            MessageKind::EndTurn => spiel_handler::handle_end_turn(content, ctx, state),

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            MessageKind::Ping => {
                ctx.antworten(ServerMessage::pong());
                Ok(ZustellBericht::default())
            }
        };

        match ergebnis {
            Ok(bericht) => {
                self.unzustellbare_bereinigen(bericht);
                DispatchErgebnis::Erfolg
            }
            Err(e) => {
                let code = e.code();
                if code == ErrorCode::InternalError {
                    tracing::error!(peer = %ctx.peer_addr, typ = art.als_str(), fehler = %e, "Anfrage fehlgeschlagen");
                } else {
                    tracing::warn!(peer = %ctx.peer_addr, typ = art.als_str(), fehler = %e, "Anfrage abgelehnt");
                }
                ctx.antworten(ServerMessage::error(code, e.client_nachricht()));
                DispatchErgebnis::Abgelehnt(code)
            }
        }
    }

    /// Meldet Spieler ab, an die nicht zugestellt werden konnte
    fn unzustellbare_bereinigen(&self, bericht: ZustellBericht) {
        for id in bericht.fehlgeschlagen {
            let entfernt = spieler_handler::spieler_bereinigen(&self.state, id);
            tracing::warn!(player_id = %id, entfernt, "Unerreichbarer Spieler abgemeldet");
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    pub fn verbindung_bereinigen(&self, verbindung: &ConnectionId) {
        if let Some(spieler) = self.state.spieler.nachschlagen(verbindung) {
            spieler_handler::spieler_bereinigen(&self.state, spieler.id);
        }
        tracing::debug!(verbindung = %verbindung, "Verbindungs-Ressourcen bereinigt");
    }
}
