//! palace-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert den Nachrichtenumschlag, die Nachrichtenarten,
//! Anfrage-Inhalte und alle Ansichten, die an Clients gehen.

pub mod control;
pub mod game;

pub use control::{ClientMessage, ErrorCode, MessageKind, ServerKind, ServerMessage};
pub use game::{
    CreateGameRequest, GameView, JoinGameRequest, MembershipEvent, PlayCardRequest, PlayerInfo,
    SessionInfo, SessionRef,
};
