//! Turn-Engine – Zustand eines laufenden Spiels
//!
//! Die Engine besitzt Nachziehstapel, Ablagestapel, die Zonen aller
//! Spieler, die Zugreihenfolge und den aktuellen Spieler.
//!
//! ## Phasen
//! ```text
//! Austeilen -> WarteAufAktion -> Beendet
//! ```
//! `Austeilen` ist nur waehrend `starten` sichtbar.
//!
//! Die Engine ist nicht selbst synchronisiert. Aufrufer muessen
//! sicherstellen, dass pro Sitzung hoechstens eine Operation gleichzeitig
//! mutiert (siehe `GameSession`/`SessionRegistry`).

use palace_core::{PalaceError, PlayerId, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, VecDeque};

use crate::card::Card;
use crate::deck::Deck;
use crate::rules::{Regelwerk, SpielAktion};

/// Karten pro Zone beim Austeilen
pub const KARTEN_PRO_ZONE: usize = 3;

/// Die Zwei ist Sonderkarte und zaehlt bei der Startspieler-Wahl nicht
const SONDERKARTEN_WERT: u8 = 2;

// ---------------------------------------------------------------------------
// Zonen
// ---------------------------------------------------------------------------

/// Kartenzonen eines Spielers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zonen {
    pub hand: Vec<Card>,
    pub face_up: Vec<Card>,
    pub face_down: Vec<Card>,
}

impl Zonen {
    pub fn karten_gesamt(&self) -> usize {
        self.hand.len() + self.face_up.len() + self.face_down.len()
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Karten werden ausgeteilt (nur intern)
    Austeilen,
    /// Ein Spieler ist am Zug
    WarteAufAktion,
    /// Spiel ist vorbei
    Beendet,
}

// ---------------------------------------------------------------------------
// TurnEngine
// ---------------------------------------------------------------------------

/// Spielzustand einer Sitzung
#[derive(Debug, Clone)]
pub struct TurnEngine {
    vorrat: Deck,
    ablage: Deck,
    zonen: HashMap<PlayerId, Zonen>,
    /// Kopf der Reihenfolge ist immer der aktuelle Spieler
    zugreihenfolge: VecDeque<PlayerId>,
    aktueller_spieler: Option<PlayerId>,
    phase: EnginePhase,
}

impl TurnEngine {
    /// Startet ein Spiel mit dem thread-lokalen RNG
    pub fn starten(spieler: &[PlayerId]) -> Result<Self> {
        Self::starten_mit(spieler, &mut rand::thread_rng())
    }

    /// Startet ein Spiel:
    /// 1. Zugreihenfolge unabhaengig von der Sitzordnung auswuerfeln
    /// 2. Frisches Deck bauen und mischen
    /// 3. Pro Spieler je 3 Karten verdeckt, offen, Hand austeilen
    /// 4. Startspieler bestimmen
    pub fn starten_mit<R: Rng + ?Sized>(spieler: &[PlayerId], rng: &mut R) -> Result<Self> {
        if spieler.is_empty() {
            return Err(PalaceError::validierung("No players to start with"));
        }

        let mut reihenfolge = spieler.to_vec();
        reihenfolge.sort();
        reihenfolge.dedup();
        reihenfolge.shuffle(rng);

        let mut vorrat = Deck::standard();
        vorrat.mischen(rng);

        let mut engine = Self {
            vorrat,
            ablage: Deck::default(),
            zonen: HashMap::with_capacity(reihenfolge.len()),
            zugreihenfolge: reihenfolge.into_iter().collect(),
            aktueller_spieler: None,
            phase: EnginePhase::Austeilen,
        };

        engine.austeilen();

        let start = engine
            .startspieler_bestimmen(rng)
            .ok_or_else(|| PalaceError::intern("starting player could not be determined"))?;
        engine.startspieler_setzen(start);
        engine.phase = EnginePhase::WarteAufAktion;

        tracing::debug!(
            spieler = engine.zugreihenfolge.len(),
            startspieler = %start,
            vorrat = engine.vorrat.len(),
            "Spiel gestartet"
        );

        Ok(engine)
    }

    /// Teilt in Zugreihenfolge aus. Reicht der Vorrat nicht, bleiben
    /// Zonen kuerzer (kein Fehler).
    fn austeilen(&mut self) {
        let reihenfolge: Vec<PlayerId> = self.zugreihenfolge.iter().copied().collect();
        for id in reihenfolge {
            let face_down = self.vorrat.ziehen(KARTEN_PRO_ZONE);
            let face_up = self.vorrat.ziehen(KARTEN_PRO_ZONE);
            let hand = self.vorrat.ziehen(KARTEN_PRO_ZONE);
            self.zonen.insert(
                id,
                Zonen {
                    hand,
                    face_up,
                    face_down,
                },
            );
        }
    }

    /// Bestimmt den Startspieler aus den aktuellen Haenden.
    ///
    /// Ein Kandidat: dieser beginnt. Mehrere: Zufallsauswahl unter ihnen.
    /// Keine Karte ueber 2 auf irgendeiner Hand: Zufallsauswahl unter allen.
    pub fn startspieler_bestimmen<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PlayerId> {
        let kandidaten = startspieler_kandidaten(self.zugreihenfolge.iter().map(|id| {
            let hand = self
                .zonen
                .get(id)
                .map(|z| z.hand.as_slice())
                .unwrap_or_default();
            (*id, hand)
        }));

        match kandidaten.as_slice() {
            [einziger] => Some(*einziger),
            [] => {
                let alle: Vec<PlayerId> = self.zugreihenfolge.iter().copied().collect();
                alle.choose(rng).copied()
            }
            mehrere => mehrere.choose(rng).copied(),
        }
    }

    /// Setzt den aktuellen Spieler und rotiert die Reihenfolge so, dass er
    /// vorne steht. Die zyklische Reihenfolge bleibt erhalten.
    fn startspieler_setzen(&mut self, id: PlayerId) {
        if let Some(pos) = self.zugreihenfolge.iter().position(|p| *p == id) {
            self.zugreihenfolge.rotate_left(pos);
            self.aktueller_spieler = Some(id);
        } else {
            tracing::warn!(player_id = %id, "Startspieler nicht im Spiel");
        }
    }

    /// Gibt den Zug weiter: der aktuelle Spieler wandert ans Ende, der neue
    /// Kopf ist am Zug. Reine Rotation ohne Aussetzen/Angriffe.
    pub fn zug_weitergeben(&mut self) -> Option<PlayerId> {
        if let Some(kopf) = self.zugreihenfolge.pop_front() {
            self.zugreihenfolge.push_back(kopf);
        }
        self.aktueller_spieler = self.zugreihenfolge.front().copied();
        self.aktueller_spieler
    }

    /// Zieht Karten vom Vorrat (alles-oder-nichts, siehe `Deck::ziehen`)
    pub fn karten_ziehen(&mut self, anzahl: usize) -> Vec<Card> {
        self.vorrat.ziehen(anzahl)
    }

    /// Legt eine Karte auf den Ablagestapel
    pub fn auf_ablage(&mut self, karte: Card) {
        self.ablage.ablegen(karte);
    }

    /// Prueft eine Aktion gegen das Regelwerk und wendet sie an.
    ///
    /// Gibt den danach aktuellen Spieler zurueck.
    pub fn aktion_anwenden(
        &mut self,
        spieler: PlayerId,
        aktion: &SpielAktion,
        regeln: &dyn Regelwerk,
    ) -> Result<Option<PlayerId>> {
        if self.phase != EnginePhase::WarteAufAktion {
            return Err(PalaceError::UngueltigeAktion(
                "Game is not awaiting an action".into(),
            ));
        }

        regeln.aktion_pruefen(self, spieler, aktion)?;

        match aktion {
            SpielAktion::Ablegen { karte } => {
                let zonen = self
                    .zonen
                    .get_mut(&spieler)
                    .ok_or_else(|| PalaceError::NichtGefunden(spieler.to_string()))?;
                let pos = zonen
                    .hand
                    .iter()
                    .position(|k| k == karte)
                    .ok_or_else(|| PalaceError::UngueltigeAktion("Card is not in hand".into()))?;
                let karte = zonen.hand.remove(pos);
                self.ablage.ablegen(karte);
            }
            SpielAktion::ZugBeenden => {}
        }

        Ok(self.zug_weitergeben())
    }

    /// Nimmt einen Spieler aus der Zugreihenfolge. Seine Zonen bleiben
    /// unangetastet, sind aber nicht mehr erreichbar.
    pub fn spieler_entfernen(&mut self, id: &PlayerId) {
        let war_am_zug = self.aktueller_spieler.as_ref() == Some(id);
        self.zugreihenfolge.retain(|p| p != id);
        if war_am_zug || self.aktueller_spieler.is_none() {
            self.aktueller_spieler = self.zugreihenfolge.front().copied();
        }
    }

    pub fn beenden(&mut self) {
        self.phase = EnginePhase::Beendet;
    }

    // -----------------------------------------------------------------------
    // Lesezugriffe
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn aktueller_spieler(&self) -> Option<PlayerId> {
        self.aktueller_spieler
    }

    pub fn zugreihenfolge(&self) -> Vec<PlayerId> {
        self.zugreihenfolge.iter().copied().collect()
    }

    pub fn zonen_von(&self, id: &PlayerId) -> Option<&Zonen> {
        self.zonen.get(id)
    }

    pub fn ablage(&self) -> &Deck {
        &self.ablage
    }

    pub fn vorrat_groesse(&self) -> usize {
        self.vorrat.len()
    }

    /// Summe aller Karten in Vorrat, Ablage und allen Zonen
    pub fn karten_gesamt(&self) -> usize {
        self.vorrat.len()
            + self.ablage.len()
            + self.zonen.values().map(Zonen::karten_gesamt).sum::<usize>()
    }
}

/// Ermittelt alle Spieler, die den kleinsten Handwert ueber 2 halten.
///
/// Die Reihenfolge der Kandidaten folgt der Eingabereihenfolge; jeder
/// Spieler erscheint hoechstens einmal.
pub fn startspieler_kandidaten<'a, I>(haende: I) -> Vec<PlayerId>
where
    I: IntoIterator<Item = (PlayerId, &'a [Card])>,
{
    let mut minimum: Option<u8> = None;
    let mut kandidaten = Vec::new();

    for (id, hand) in haende {
        let Some(wert) = hand
            .iter()
            .map(Card::wert)
            .filter(|w| *w > SONDERKARTEN_WERT)
            .min()
        else {
            continue;
        };

        match minimum {
            Some(m) if wert > m => {}
            Some(m) if wert == m => kandidaten.push(id),
            _ => {
                minimum = Some(wert);
                kandidaten.clear();
                kandidaten.push(id);
            }
        }
    }

    kandidaten
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
