//! Control-Protokoll (WebSocket-Textframes)
//!
//! Jede Nachricht ist ein Umschlag `{"type": ..., "content": ...}`. Der
//! Inhalt ist immer ein String; strukturierte Nutzdaten werden als
//! JSON-Dokument in diesen String kodiert.
//!
//! ```text
//! {"type":"join_game","content":"{\"name\":\"g1\",\"password\":\"pw\"}"}
//! ```
//!
//! Fehlerantworten tragen zusaetzlich einen maschinenlesbaren `code`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Antworten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    NotFound,
    UnknownType,
    // Registrierung
    NotRegistered,
    NameTaken,
    // Spiel
    GameFull,
    WrongPassword,
    NotYourTurn,
    IllegalAction,
    PermissionDenied,
    // Server
    ServerShutdown,
}

// ---------------------------------------------------------------------------
// Nachrichtenarten
// ---------------------------------------------------------------------------

/// Eingehende Nachrichtenarten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Register,
    Unregister,
    CreateGame,
    JoinGame,
    LeaveGame,
    AllGames,
    StartGame,
    PlayCard,
    EndTurn,
    Ping,
}

impl MessageKind {
    pub const ALLE: [MessageKind; 10] = [
        MessageKind::Register,
        MessageKind::Unregister,
        MessageKind::CreateGame,
        MessageKind::JoinGame,
        MessageKind::LeaveGame,
        MessageKind::AllGames,
        MessageKind::StartGame,
        MessageKind::PlayCard,
        MessageKind::EndTurn,
        MessageKind::Ping,
    ];

    pub fn als_str(self) -> &'static str {
        match self {
            MessageKind::Register => "register",
            MessageKind::Unregister => "unregister",
            MessageKind::CreateGame => "create_game",
            MessageKind::JoinGame => "join_game",
            MessageKind::LeaveGame => "leave_game",
            MessageKind::AllGames => "all_games",
            MessageKind::StartGame => "start_game",
            MessageKind::PlayCard => "play_card",
            MessageKind::EndTurn => "end_turn",
            MessageKind::Ping => "ping",
        }
    }

    /// Unbekannte Arten ergeben `None` (kein Fehler, die Verbindung bleibt offen)
    pub fn parsen(art: &str) -> Option<Self> {
        Self::ALLE.into_iter().find(|k| k.als_str() == art)
    }
}

/// Ausgehende Nachrichtenarten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerKind {
    Success,
    Error,
    AllGames,
    NewGame,
    PlayerJoined,
    PlayerLeft,
    GameState,
    Pong,
}

// ---------------------------------------------------------------------------
// Umschlaege
// ---------------------------------------------------------------------------

/// Nachricht vom Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub art: String,
    #[serde(default)]
    pub content: String,
}

impl ClientMessage {
    pub fn new(art: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            art: art.into(),
            content: content.into(),
        }
    }

    /// Nachricht mit JSON-kodiertem Inhalt
    pub fn mit_inhalt<T: Serialize>(art: MessageKind, inhalt: &T) -> serde_json::Result<Self> {
        Ok(Self::new(art.als_str(), serde_json::to_string(inhalt)?))
    }

    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::parsen(&self.art)
    }

    /// Dekodiert den String-Inhalt als JSON-Dokument
    pub fn inhalt<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.content)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Nachricht vom Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub art: ServerKind,
    pub content: String,
    /// Nur bei Fehlern gesetzt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ServerMessage {
    pub fn new(art: ServerKind, content: impl Into<String>) -> Self {
        Self {
            art,
            content: content.into(),
            code: None,
        }
    }

    /// Nachricht mit JSON-kodiertem Inhalt
    pub fn mit_inhalt<T: Serialize>(art: ServerKind, inhalt: &T) -> serde_json::Result<Self> {
        Ok(Self::new(art, serde_json::to_string(inhalt)?))
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(ServerKind::Success, content)
    }

    pub fn error(code: ErrorCode, nachricht: impl Into<String>) -> Self {
        Self {
            art: ServerKind::Error,
            content: nachricht.into(),
            code: Some(code),
        }
    }

    pub fn pong() -> Self {
        Self::new(ServerKind::Pong, "")
    }

    pub fn ist_fehler(&self) -> bool {
        self.art == ServerKind::Error
    }

    /// Dekodiert den String-Inhalt als JSON-Dokument
    pub fn inhalt<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.content)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
