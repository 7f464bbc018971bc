//! Regelwerk-Schnittstelle
//!
//! Die Engine kennt nur Zugreihenfolge und Zonen. Welche Aktion in welcher
//! Lage erlaubt ist, entscheidet ein `Regelwerk`. Der mitgelieferte
//! `NurZugreihenfolge` prueft lediglich, wer am Zug ist und ob die Karte
//! auf der Hand liegt.

use palace_core::{PalaceError, PlayerId, Result};
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::engine::TurnEngine;

/// Aktion eines Spielers waehrend `WarteAufAktion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aktion", rename_all = "snake_case")]
pub enum SpielAktion {
    /// Karte von der Hand auf die Ablage legen
    Ablegen { karte: Card },
    /// Zug ohne Karte beenden
    ZugBeenden,
}

/// Entscheidet ueber Zulaessigkeit von Spielaktionen
pub trait Regelwerk: Send + Sync {
    /// Von wem wird als naechstes eine Aktion erwartet?
    fn aktion_erwarten(&self, engine: &TurnEngine) -> Option<PlayerId> {
        engine.aktueller_spieler()
    }

    /// Prueft eine Aktion, ohne den Zustand zu veraendern
    fn aktion_pruefen(
        &self,
        engine: &TurnEngine,
        spieler: PlayerId,
        aktion: &SpielAktion,
    ) -> Result<()>;
}

/// Minimales Regelwerk: nur der aktuelle Spieler darf handeln
#[derive(Debug, Clone, Copy, Default)]
pub struct NurZugreihenfolge;

impl Regelwerk for NurZugreihenfolge {
    fn aktion_pruefen(
        &self,
        engine: &TurnEngine,
        spieler: PlayerId,
        aktion: &SpielAktion,
    ) -> Result<()> {
        if self.aktion_erwarten(engine) != Some(spieler) {
            return Err(PalaceError::NichtAmZug);
        }

        if let SpielAktion::Ablegen { karte } = aktion {
            let auf_hand = engine
                .zonen_von(&spieler)
                .is_some_and(|z| z.hand.contains(karte));
            if !auf_hand {
                return Err(PalaceError::UngueltigeAktion(format!(
                    "{} is not in hand",
                    karte
                )));
            }
        }

        Ok(())
    }
}
