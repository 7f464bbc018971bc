//! Karten-Modell
//!
//! Eine Karte ist ein unveraenderlicher Wert aus Farbe und Rang. Auf dem
//! Draht sieht eine Karte so aus:
//!
//! ```json
//! {"suit": "hearts", "rank": {"name": "ten", "value": 10}}
//! ```
//!
//! Es gibt zwei Joker-Raenge (`small` = 0, `big` = 1); die Zahlenraenge
//! laufen von 2 bis 14 (Ass hoch).

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Farbe
// ---------------------------------------------------------------------------

/// Kartenfarbe (inkl. Joker)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Spades,
    Diamonds,
    Hearts,
    Joker,
}

impl Suit {
    /// Die vier regulaeren Farben in kanonischer Reihenfolge
    pub const REGULAER: [Suit; 4] = [Suit::Clubs, Suit::Spades, Suit::Diamonds, Suit::Hearts];

    pub fn name(self) -> &'static str {
        match self {
            Suit::Clubs => "clubs",
            Suit::Spades => "spades",
            Suit::Diamonds => "diamonds",
            Suit::Hearts => "hearts",
            Suit::Joker => "joker",
        }
    }
}

// ---------------------------------------------------------------------------
// Rang
// ---------------------------------------------------------------------------

/// Kartenrang
///
/// Die Reihenfolge der Varianten entspricht dem Zahlenwert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "RankWire", try_from = "RankWire")]
pub enum Rank {
    Small,
    Big,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Alle Zahlenraenge (2..=14) in aufsteigender Reihenfolge
    pub const ZAHLEN: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Zahlenwert des Rangs (Joker: 0 und 1, Ass: 14)
    pub fn wert(self) -> u8 {
        match self {
            Rank::Small => 0,
            Rank::Big => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
        }
    }

    /// Drahtname des Rangs
    pub fn name(self) -> &'static str {
        match self {
            Rank::Small => "small",
            Rank::Big => "big",
            Rank::Two => "two",
            Rank::Three => "three",
            Rank::Four => "four",
            Rank::Five => "five",
            Rank::Six => "six",
            Rank::Seven => "seven",
            Rank::Eight => "eight",
            Rank::Nine => "nine",
            Rank::Ten => "ten",
            Rank::Jack => "jack",
            Rank::Queen => "queen",
            Rank::King => "king",
            Rank::Ace => "ace",
        }
    }

    /// Sucht einen Rang anhand seines Drahtnamens
    pub fn aus_name(name: &str) -> Option<Self> {
        [Rank::Small, Rank::Big]
            .into_iter()
            .chain(Rank::ZAHLEN)
            .find(|r| r.name() == name)
    }

    pub fn ist_joker(self) -> bool {
        matches!(self, Rank::Small | Rank::Big)
    }
}

/// Drahtdarstellung eines Rangs: `{"name": "...", "value": n}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RankWire {
    name: String,
    #[serde(default)]
    value: u8,
}

impl From<Rank> for RankWire {
    fn from(rank: Rank) -> Self {
        Self {
            name: rank.name().to_string(),
            value: rank.wert(),
        }
    }
}

impl TryFrom<RankWire> for Rank {
    type Error = String;

    fn try_from(wire: RankWire) -> Result<Self, Self::Error> {
        let rank = Rank::aus_name(&wire.name)
            .ok_or_else(|| format!("Unbekannter Rang: {}", wire.name))?;
        if rank.wert() != wire.value {
            return Err(format!(
                "Rang {} hat Wert {}, nicht {}",
                wire.name,
                rank.wert(),
                wire.value
            ));
        }
        Ok(rank)
    }
}

// ---------------------------------------------------------------------------
// Karte
// ---------------------------------------------------------------------------

/// Eine Spielkarte. Karten haben keine Identitaet ausser Farbe + Rang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    pub const fn kleiner_joker() -> Self {
        Self::new(Suit::Joker, Rank::Small)
    }

    pub const fn grosser_joker() -> Self {
        Self::new(Suit::Joker, Rank::Big)
    }

    /// Zahlenwert der Karte
    pub fn wert(&self) -> u8 {
        self.rank.wert()
    }

    pub fn ist_joker(&self) -> bool {
        self.suit == Suit::Joker
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ist_joker() {
            write!(f, "{} joker", self.rank.name())
        } else {
            write!(f, "{} of {}", self.rank.name(), self.suit.name())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
