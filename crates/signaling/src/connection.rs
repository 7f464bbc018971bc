//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Ausgehende Nachrichten laufen ausschliesslich ueber die
//! begrenzte Send-Queue der Verbindung; Broadcaster und Handler schreiben
//! nie direkt auf den Socket.
//!
//! ```text
//!  Socket --Text--> ClientMessage --> MessageDispatcher --> Handler
//!    ^                                                        |
//!    |                                                        v
//!    +----Text---- ServerMessage <---- Send-Queue <---- ClientSender
//! ```
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Kommt `verbindungs_timeout_sek` lang nichts an, wird getrennt
//!
//! ## Aufraeumen
//! Auf jedem Ausstiegspfad wird der Spieler abgemeldet und aus allen
//! Sitzungen entfernt. Erst danach werden Socket und Verbindungsplatz
//! freigegeben.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use palace_core::ConnectionId;
use palace_protocol::{ClientMessage, ErrorCode, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};

use crate::broadcast::ClientSender;
use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::{SignalingState, VerbindungsPlatz};

/// Warum die Verbindungsschleife endete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrennGrund {
    ClientGetrennt,
    Timeout,
    Lesefehler,
    Sendefehler,
    Shutdown,
}

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
    verbindung: ConnectionId,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            peer_addr,
            verbindung: ConnectionId::new(),
        }
    }

    /// Startet die Verarbeitungsschleife und raeumt danach auf.
    ///
    /// Socket und `platz` werden erst nach dem Aufraeumen freigegeben.
    pub async fn verarbeiten(
        self,
        socket: WebSocket,
        shutdown_rx: watch::Receiver<bool>,
        platz: VerbindungsPlatz,
    ) {
        let peer_addr = self.peer_addr;
        let verbindung = self.verbindung;
        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Neue Verbindung");

        let (sender, sende_rx) =
            ClientSender::kanal(verbindung, self.state.config.send_queue_groesse);
        let mut ctx = DispatcherContext::neu(peer_addr, sender);
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        let (mut ws_tx, mut ws_rx) = socket.split();
        let grund = self
            .schleife(&mut ws_tx, &mut ws_rx, &dispatcher, &mut ctx, sende_rx, shutdown_rx)
            .await;

        dispatcher.verbindung_bereinigen(&verbindung);
        drop(ws_tx);
        drop(ws_rx);
        drop(platz);

        tracing::info!(
            peer = %peer_addr,
            verbindung = %verbindung,
            grund = ?grund,
            "Verbindungs-Task beendet"
        );
    }

    async fn schleife(
        &self,
        ws_tx: &mut SplitSink<WebSocket, Message>,
        ws_rx: &mut SplitStream<WebSocket>,
        dispatcher: &MessageDispatcher,
        ctx: &mut DispatcherContext,
        mut sende_rx: tokio::sync::mpsc::Receiver<ServerMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> TrennGrund {
        let peer_addr = self.peer_addr;
        let keepalive = Duration::from_secs(self.state.config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek.max(1));

        let mut ping_takt = interval_at(Instant::now() + keepalive, keepalive);
        let mut letzter_empfang = Instant::now();

        if *shutdown_rx.borrow() {
            return TrennGrund::Shutdown;
        }

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    let nachricht = match frame {
                        Some(Ok(nachricht)) => nachricht,
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            return TrennGrund::Lesefehler;
                        }
                        None => return TrennGrund::ClientGetrennt,
                    };
                    letzter_empfang = Instant::now();

                    match nachricht {
                        Message::Text(text) => match ClientMessage::from_json(&text) {
                            Ok(anfrage) => {
                                dispatcher.dispatch(anfrage, ctx).await;
                            }
                            Err(e) => {
                                tracing::warn!(peer = %peer_addr, fehler = %e, "Ungueltiger Umschlag");
                                ctx.antworten(ServerMessage::error(
                                    ErrorCode::InvalidRequest,
                                    format!("Invalid envelope: {e}"),
                                ));
                            }
                        },
                        Message::Binary(_) => {
                            ctx.antworten(ServerMessage::error(
                                ErrorCode::InvalidRequest,
                                "Only text frames are supported",
                            ));
                        }
                        Message::Close(_) => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            return TrennGrund::ClientGetrennt;
                        }
                        // axum beantwortet Pings selbst
                        Message::Ping(_) | Message::Pong(_) => {}
                    }
                }

                // Ausgehende Nachricht aus der Send-Queue
                Some(ausgehend) = sende_rx.recv() => {
                    let text = match ausgehend.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(peer = %peer_addr, fehler = %e, "Nachricht nicht serialisierbar");
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                        return TrennGrund::Sendefehler;
                    }
                }

                // Keepalive-Ping und Timeout
                _ = ping_takt.tick() => {
                    if letzter_empfang.elapsed() > timeout_dauer {
                        tracing::warn!(peer = %peer_addr, "Verbindungs-Timeout");
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return TrennGrund::Timeout;
                    }
                    if let Err(e) = ws_tx.send(Message::Ping(Vec::new())).await {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Ping-Senden fehlgeschlagen");
                        return TrennGrund::Sendefehler;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        let abschied = ServerMessage::error(
                            ErrorCode::ServerShutdown,
                            "Server is shutting down",
                        );
                        if let Ok(text) = abschied.to_json() {
                            let _ = ws_tx.send(Message::Text(text)).await;
                        }
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return TrennGrund::Shutdown;
                    }
                }
            }
        }
    }
}
