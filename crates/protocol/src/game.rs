//! Spiel-Nachrichten: Anfrage-Inhalte und Ansichten fuer Clients
//!
//! Ansichten werden immer aus einer gesperrten `GameSession` gebaut und
//! enthalten nie Passwoerter, Passwort-Hashes oder verdeckte Karten anderer
//! Spieler.

use palace_core::PlayerId;
use palace_game::{Card, GameSession};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Anfragen
// ---------------------------------------------------------------------------

/// Inhalt von `create_game`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub number_of_players: usize,
    #[serde(default)]
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Inhalt von `join_game`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Inhalt von `leave_game`, `start_game` und `end_turn`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    pub name: String,
}

/// Inhalt von `play_card`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCardRequest {
    pub name: String,
    pub card: Card,
}

// ---------------------------------------------------------------------------
// Ansichten
// ---------------------------------------------------------------------------

/// Oeffentliche Spielerdarstellung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
}

/// Oeffentliche Sitzungsdarstellung (Lobby)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub name: String,
    pub private: bool,
    pub creator: Option<PlayerInfo>,
    pub status: String,
    pub number_of_players: usize,
}

impl SessionInfo {
    pub fn aus_sitzung(sitzung: &GameSession) -> Self {
        Self {
            name: sitzung.id().to_string(),
            private: sitzung.ist_privat(),
            creator: sitzung.ersteller().map(|t| PlayerInfo {
                name: t.name.clone(),
            }),
            status: sitzung.status().als_text().to_string(),
            number_of_players: sitzung.kapazitaet(),
        }
    }
}

/// Mitgliedschaftsereignis (`player_joined` / `player_left`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub game: String,
    pub player: PlayerInfo,
}

/// Eigene Zonen des Empfaengers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnZones {
    pub hand: Vec<Card>,
    pub face_up: Vec<Card>,
    pub face_down_count: usize,
}

/// Was der Empfaenger von einem Mitspieler sehen darf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentView {
    pub name: String,
    pub face_up: Vec<Card>,
    pub hand_count: usize,
    pub face_down_count: usize,
}

/// Spielzustand aus Sicht genau eines Spielers (`game_state`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub name: String,
    pub status: String,
    pub current_player: Option<String>,
    pub turn_order: Vec<String>,
    pub draw_pile_count: usize,
    pub pile: Vec<Card>,
    pub you: OwnZones,
    pub opponents: Vec<OpponentView>,
}

impl GameView {
    /// Baut die Ansicht fuer `empfaenger`. Ohne laufende Engine sind alle
    /// Kartenfelder leer.
    pub fn fuer_spieler(sitzung: &GameSession, empfaenger: PlayerId) -> Self {
        let name_von = |id: &PlayerId| sitzung.mitglied(id).map(|t| t.name.clone());

        let Some(engine) = sitzung.engine() else {
            return Self {
                name: sitzung.id().to_string(),
                status: sitzung.status().als_text().to_string(),
                current_player: None,
                turn_order: Vec::new(),
                draw_pile_count: 0,
                pile: Vec::new(),
                you: OwnZones::default(),
                opponents: Vec::new(),
            };
        };

        let reihenfolge = engine.zugreihenfolge();

        let you = engine
            .zonen_von(&empfaenger)
            .map(|z| OwnZones {
                hand: z.hand.clone(),
                face_up: z.face_up.clone(),
                face_down_count: z.face_down.len(),
            })
            .unwrap_or_default();

        let opponents = reihenfolge
            .iter()
            .filter(|id| **id != empfaenger)
            .filter_map(|id| {
                let name = name_von(id)?;
                let z = engine.zonen_von(id)?;
                Some(OpponentView {
                    name,
                    face_up: z.face_up.clone(),
                    hand_count: z.hand.len(),
                    face_down_count: z.face_down.len(),
                })
            })
            .collect();

        Self {
            name: sitzung.id().to_string(),
            status: sitzung.status().als_text().to_string(),
            current_player: engine.aktueller_spieler().and_then(|id| name_von(&id)),
            turn_order: reihenfolge.iter().filter_map(name_von).collect(),
            draw_pile_count: engine.vorrat_groesse(),
            pile: engine.ablage().karten().to_vec(),
            you,
            opponents,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
