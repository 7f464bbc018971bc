//! palace-signaling – WebSocket Control Layer
//!
//! Dieser Crate implementiert den Sitzungs-Service fuer Palace. Er verwaltet
//! WebSocket-Verbindungen, registrierte Spieler, die Lobby und verteilt
//! Spielereignisse an die Mitglieder einer Sitzung.
//!
//! ## Architektur
//!
//! ```text
//! axum Router (SignalingServer)
//!     |  /ws, /health
//!     v
//! ClientConnection (pro Verbindung ein Task, eigene Send-Queue)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- SpielerHandler  (register, unregister)
//!     +-- LobbyHandler    (create_game, join_game, leave_game, all_games)
//!     +-- SpielHandler    (start_game, play_card, end_turn)
//!
//! SpielerRegistry  – Welche Verbindung gehoert zu welchem Spieler
//! SessionRegistry  – Alle Sitzungen (palace-game)
//! EventBroadcaster – Events an Spieler, Sitzungen oder alle verteilen
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod players;
pub mod server_state;
pub mod ws;

// Bequeme Re-Exporte
pub use broadcast::{ClientSender, EventBroadcaster, ZustellBericht};
pub use connection::ClientConnection;
pub use dispatcher::{DispatchErgebnis, DispatcherContext, MessageDispatcher};
pub use error::{SignalingError, SignalingResult};
pub use players::{Spieler, SpielerRegistry};
pub use server_state::{SignalingConfig, SignalingState};
pub use ws::{router, SignalingServer};
