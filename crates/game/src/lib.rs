//! palace-game – Karten, Turn-Engine und Sitzungen
//!
//! ## Architektur
//!
//! ```text
//! SessionRegistry  (ein Mutex ueber der Map id -> Sitzung)
//!     |
//!     v
//! GameSession      (Mitglieder, Status, Sichtbarkeit – eigener Mutex)
//!     |
//!     v
//! TurnEngine       (Vorrat, Ablage, Zonen, Zugreihenfolge)
//!     |
//!     v
//! Card / Deck
//! ```
//!
//! Regelpruefungen laufen ueber das `Regelwerk`-Trait; das Standard-
//! Regelwerk erzwingt nur Zugreihenfolge und Kartenbesitz.

pub mod card;
pub mod deck;
pub mod engine;
pub mod password;
pub mod registry;
pub mod rules;
pub mod session;
pub mod validierung;

// Bequeme Re-Exporte
pub use card::{Card, Rank, Suit};
pub use deck::Deck;
pub use engine::{EnginePhase, TurnEngine, Zonen};
pub use registry::{SessionRegistry, SharedSession};
pub use rules::{NurZugreihenfolge, Regelwerk, SpielAktion};
pub use session::{BeitrittErgebnis, GameSession, SessionDescriptor, SessionStatus, Teilnehmer};
