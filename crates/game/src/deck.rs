//! Kartenstapel
//!
//! Ein `Deck` ist eine geordnete Kartenfolge. Gezogen wird von vorne,
//! abgelegt wird hinten. Derselbe Typ dient als Nachziehstapel und als
//! Ablagestapel.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, Suit};

/// Groesse des Standarddecks: 52 Karten plus 2 Joker
pub const STANDARD_DECK_GROESSE: usize = 54;

/// Geordneter Kartenstapel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    karten: Vec<Card>,
}

impl Deck {
    /// Standarddeck in kanonischer Reihenfolge (ungemischt):
    /// Clubs 2..A, Spades 2..A, Diamonds 2..A, Hearts 2..A, kleiner Joker, grosser Joker.
    pub fn standard() -> Self {
        let mut karten = Vec::with_capacity(STANDARD_DECK_GROESSE);
        for suit in Suit::REGULAER {
            for rank in Rank::ZAHLEN {
                karten.push(Card::new(suit, rank));
            }
        }
        karten.push(Card::kleiner_joker());
        karten.push(Card::grosser_joker());
        Self { karten }
    }

    pub fn aus_karten(karten: Vec<Card>) -> Self {
        Self { karten }
    }

    /// Mischt den Stapel gleichverteilt mit der gegebenen Zufallsquelle
    pub fn mischen<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.karten.shuffle(rng);
    }

    /// Mischt mit dem thread-lokalen RNG (neu geseedet pro Prozess)
    pub fn mischen_zufaellig(&mut self) {
        self.mischen(&mut rand::thread_rng());
    }

    /// Zieht `anzahl` Karten von vorne.
    ///
    /// Alles-oder-nichts: liegen weniger als `anzahl` Karten auf dem Stapel,
    /// wird nichts gezogen und der Stapel bleibt unveraendert. Ein leeres
    /// Ergebnis bedeutet "nichts gezogen", nicht Fehler.
    pub fn ziehen(&mut self, anzahl: usize) -> Vec<Card> {
        if anzahl > self.karten.len() {
            return Vec::new();
        }
        self.karten.drain(..anzahl).collect()
    }

    /// Legt eine Karte hinten auf den Stapel
    pub fn ablegen(&mut self, karte: Card) {
        self.karten.push(karte);
    }

    /// Zuletzt abgelegte Karte
    pub fn oberste(&self) -> Option<&Card> {
        self.karten.last()
    }

    pub fn karten(&self) -> &[Card] {
        &self.karten
    }

    pub fn len(&self) -> usize {
        self.karten.len()
    }

    pub fn is_empty(&self) -> bool {
        self.karten.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
