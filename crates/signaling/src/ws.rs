//! WebSocket-Listener – Router bauen, Socket binden, Verbindungen annehmen
//!
//! Der `SignalingServer` bindet einen TCP-Socket und serviert per axum den
//! WebSocket-Endpunkt (`ws_pfad`) sowie `/health`. Jede angenommene
//! Verbindung laeuft als eigener tokio-Task in einer `ClientConnection`.
//!
//! ## Verbindungslimit
//! Vor dem Upgrade wird ein Verbindungsplatz reserviert. Ist der Server
//! voll, wird das Upgrade mit 503 abgelehnt.

use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use palace_observability::health_router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

#[derive(Clone)]
struct WsState {
    state: Arc<SignalingState>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Baut den Router: WebSocket-Endpunkt und Health-Check
pub fn router(state: Arc<SignalingState>, shutdown_rx: watch::Receiver<bool>) -> Router {
    let pfad = state.config.ws_pfad.clone();
    let ws = Router::new()
        .route(&pfad, get(ws_handler))
        .with_state(WsState {
            state: Arc::clone(&state),
            shutdown_rx,
        });

    ws.merge(health_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(ws_state): State<WsState>,
) -> Response {
    let Some(platz) = ws_state.state.platz_reservieren() else {
        tracing::warn!(
            peer = %peer_addr,
            max = ws_state.state.config.max_clients,
            "Server voll – Verbindung abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Server full").into_response();
    };

    tracing::debug!(peer = %peer_addr, "Upgrade akzeptiert");

    let WsState { state, shutdown_rx } = ws_state;
    ws.on_upgrade(move |socket| async move {
        ClientConnection::neu(state, peer_addr)
            .verarbeiten(socket, shutdown_rx, platz)
            .await;
    })
}

/// WebSocket-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
    bind_addr: SocketAddr,
}

impl SignalingServer {
    /// Erstellt einen neuen SignalingServer
    pub fn neu(state: Arc<SignalingState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Bindet den Socket und laeuft bis `shutdown_rx` `true` meldet
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.mit_listener(listener, shutdown_rx).await
    }

    /// Wie `starten`, aber auf einem bereits gebundenen Listener
    pub async fn mit_listener(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_addr,
            pfad = %self.state.config.ws_pfad,
            "WebSocket Signaling-Server gestartet"
        );

        let app = router(Arc::clone(&self.state), shutdown_rx.clone());
        let mut signal = shutdown_rx;

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = signal.wait_for(|stopp| *stopp).await;
            tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
        })
        .await?;

        tracing::info!("WebSocket Signaling-Server gestoppt");
        Ok(())
    }

    /// Gibt die Bind-Adresse zurueck
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
