//! Spielsitzung
//!
//! Eine `GameSession` haelt Mitglieder, Status, Sichtbarkeit und (sobald
//! gestartet) die `TurnEngine`. Alle Mutationen einer Sitzung laufen unter
//! ihrem eigenen Mutex (siehe `SessionRegistry`), dadurch sind Beitritte
//! und Zuege auf derselben Sitzung serialisiert.
//!
//! ## Status-Uebergaenge
//! ```text
//! Created --beitreten--> WaitingForPlayers --starten--> Running --beenden--> Finished
//!                                                          |
//!                                             < 2 Mitglieder nach verlassen
//! ```

use palace_core::{PalaceError, PlayerId, Result};
use rand::Rng;
use std::collections::HashMap;

use crate::engine::TurnEngine;
use crate::password;
use crate::rules::{Regelwerk, SpielAktion};
use crate::validierung::name_pruefen;

/// Kleinste erlaubte Spielerzahl
pub const MIN_KAPAZITAET: usize = 2;
/// Groesste erlaubte Spielerzahl
pub const MAX_KAPAZITAET: usize = 5;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Created,
    WaitingForPlayers,
    Running,
    Finished,
}

impl SessionStatus {
    /// Anzeigetext fuer Clients
    pub fn als_text(self) -> &'static str {
        match self {
            SessionStatus::Created => "Created",
            SessionStatus::WaitingForPlayers => "Waiting For Players",
            SessionStatus::Running => "Running",
            SessionStatus::Finished => "Finished",
        }
    }

    /// Nimmt die Sitzung noch neue Spieler an?
    pub fn offen(self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::WaitingForPlayers)
    }
}

// ---------------------------------------------------------------------------
// Beschreibung / Teilnehmer
// ---------------------------------------------------------------------------

/// Anfrage zum Anlegen einer Sitzung (noch ungeprueft)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub id: String,
    pub kapazitaet: usize,
    pub privat: bool,
    pub passwort: Option<String>,
}

impl SessionDescriptor {
    /// Oeffentliche Sitzung
    pub fn oeffentlich(id: impl Into<String>, kapazitaet: usize) -> Self {
        Self {
            id: id.into(),
            kapazitaet,
            privat: false,
            passwort: None,
        }
    }

    /// Private Sitzung mit Passwort
    pub fn privat(id: impl Into<String>, kapazitaet: usize, passwort: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kapazitaet,
            privat: true,
            passwort: Some(passwort.into()),
        }
    }

    /// Prueft Form und Grenzen, ohne etwas anzulegen
    pub fn validieren(&self) -> Result<()> {
        name_pruefen(&self.id, "Game name")?;

        if !(MIN_KAPAZITAET..=MAX_KAPAZITAET).contains(&self.kapazitaet) {
            return Err(PalaceError::validierung(format!(
                "Number of players must be between {MIN_KAPAZITAET} and {MAX_KAPAZITAET}"
            )));
        }

        if self.privat {
            let leer = self.passwort.as_deref().map_or(true, |p| p.trim().is_empty());
            if leer {
                return Err(PalaceError::validierung(
                    "Private games require a password",
                ));
            }
        }

        Ok(())
    }
}

/// Sichtbarkeit einer Sitzung. Das Klartext-Passwort wird nie gespeichert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sichtbarkeit {
    Oeffentlich,
    Privat { passwort_hash: String },
}

/// Mitglied einer Sitzung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teilnehmer {
    pub id: PlayerId,
    pub name: String,
}

impl Teilnehmer {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Ergebnis eines Beitritts. `Voll` und `Geschlossen` sind erwartete
/// Ausgaenge, keine Fehler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeitrittErgebnis {
    Beigetreten,
    Voll,
    /// Spiel laeuft oder ist beendet
    Geschlossen,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GameSession {
    id: String,
    kapazitaet: usize,
    sichtbarkeit: Sichtbarkeit,
    status: SessionStatus,
    ersteller: Option<Teilnehmer>,
    mitglieder: HashMap<PlayerId, Teilnehmer>,
    /// Beitrittsreihenfolge (fuer stabile Anzeige)
    sitzordnung: Vec<PlayerId>,
    engine: Option<TurnEngine>,
}

impl GameSession {
    /// Legt eine Sitzung an. Hasht das Passwort (teuer), also ausserhalb
    /// jedes Locks aufrufen.
    pub fn neu(desc: SessionDescriptor) -> Result<Self> {
        desc.validieren()?;

        let sichtbarkeit = match (desc.privat, desc.passwort.as_deref()) {
            (true, Some(pw)) => Sichtbarkeit::Privat {
                passwort_hash: password::passwort_hashen(pw)?,
            },
            _ => Sichtbarkeit::Oeffentlich,
        };

        Ok(Self {
            id: desc.id,
            kapazitaet: desc.kapazitaet,
            sichtbarkeit,
            status: SessionStatus::Created,
            ersteller: None,
            mitglieder: HashMap::new(),
            sitzordnung: Vec::new(),
            engine: None,
        })
    }

    /// Fuegt einen Spieler hinzu, sofern Platz ist und das Spiel noch
    /// nicht gestartet wurde.
    ///
    /// Tritt dieselbe Identitaet erneut bei, wird ihr Eintrag ueberschrieben;
    /// Doppeleintraege entstehen nicht.
    pub fn beitreten(&mut self, teilnehmer: Teilnehmer) -> BeitrittErgebnis {
        // Nach dem Start muss die Zugreihenfolge alle Mitglieder enthalten
        if !self.status.offen() {
            return BeitrittErgebnis::Geschlossen;
        }

        let bereits_mitglied = self.mitglieder.contains_key(&teilnehmer.id);
        if !bereits_mitglied && self.mitglieder.len() >= self.kapazitaet {
            return BeitrittErgebnis::Voll;
        }

        if !bereits_mitglied {
            self.sitzordnung.push(teilnehmer.id);
        }
        self.mitglieder.insert(teilnehmer.id, teilnehmer);

        if self.status == SessionStatus::Created {
            self.status = SessionStatus::WaitingForPlayers;
        }
        BeitrittErgebnis::Beigetreten
    }

    /// Setzt den Ersteller und tritt dabei implizit bei.
    pub fn ersteller_setzen(&mut self, teilnehmer: Teilnehmer) -> Result<()> {
        if !self.mitglieder.contains_key(&teilnehmer.id) {
            match self.beitreten(teilnehmer.clone()) {
                BeitrittErgebnis::Beigetreten => {}
                BeitrittErgebnis::Voll => return Err(PalaceError::SitzungVoll),
                BeitrittErgebnis::Geschlossen => {
                    return Err(PalaceError::UngueltigeAktion(format!(
                        "Game '{}' is already running or finished",
                        self.id
                    )))
                }
            }
        }
        self.ersteller = Some(teilnehmer);
        Ok(())
    }

    /// Entfernt einen Spieler. Gibt false zurueck wenn er kein Mitglied war.
    ///
    /// Laeuft das Spiel, verliert der Spieler auch seinen Platz in der
    /// Zugreihenfolge. Bleiben weniger als 2 Mitglieder, endet das Spiel.
    pub fn verlassen(&mut self, id: &PlayerId) -> bool {
        if self.mitglieder.remove(id).is_none() {
            return false;
        }
        self.sitzordnung.retain(|p| p != id);

        if let Some(engine) = self.engine.as_mut() {
            engine.spieler_entfernen(id);
        }

        if self.status == SessionStatus::Running && self.mitglieder.len() < MIN_KAPAZITAET {
            self.beenden();
        }
        true
    }

    /// Startet das Spiel mit dem thread-lokalen RNG
    pub fn starten(&mut self) -> Result<()> {
        self.starten_mit(&mut rand::thread_rng())
    }

    /// Baut, mischt und verteilt das Deck und bestimmt den Startspieler
    pub fn starten_mit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.status != SessionStatus::WaitingForPlayers {
            return Err(PalaceError::UngueltigeAktion(format!(
                "Game cannot be started in status '{}'",
                self.status.als_text()
            )));
        }
        if self.mitglieder.len() < MIN_KAPAZITAET {
            return Err(PalaceError::UngueltigeAktion(format!(
                "At least {MIN_KAPAZITAET} players required"
            )));
        }

        let engine = TurnEngine::starten_mit(&self.sitzordnung, rng)?;
        self.engine = Some(engine);
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// Beendet das Spiel (idempotent)
    pub fn beenden(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.beenden();
        }
        self.status = SessionStatus::Finished;
    }

    /// Fuehrt eine Spielaktion aus und gibt den naechsten Spieler zurueck
    pub fn aktion(
        &mut self,
        spieler: PlayerId,
        aktion: &SpielAktion,
        regeln: &dyn Regelwerk,
    ) -> Result<Option<PlayerId>> {
        if self.status != SessionStatus::Running {
            return Err(PalaceError::UngueltigeAktion("Game is not running".into()));
        }
        if !self.mitglieder.contains_key(&spieler) {
            return Err(PalaceError::NichtGefunden(spieler.to_string()));
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| PalaceError::intern("running game without engine"))?;
        engine.aktion_anwenden(spieler, aktion, regeln)
    }

    // -----------------------------------------------------------------------
    // Lesezugriffe
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kapazitaet(&self) -> usize {
        self.kapazitaet
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn ist_privat(&self) -> bool {
        matches!(self.sichtbarkeit, Sichtbarkeit::Privat { .. })
    }

    /// PHC-Hash privater Sitzungen, zum Verifizieren ausserhalb des Locks
    pub fn passwort_hash(&self) -> Option<&str> {
        match &self.sichtbarkeit {
            Sichtbarkeit::Privat { passwort_hash } => Some(passwort_hash),
            Sichtbarkeit::Oeffentlich => None,
        }
    }

    pub fn ersteller(&self) -> Option<&Teilnehmer> {
        self.ersteller.as_ref()
    }

    pub fn ist_ersteller(&self, id: &PlayerId) -> bool {
        self.ersteller.as_ref().is_some_and(|t| t.id == *id)
    }

    pub fn ist_mitglied(&self, id: &PlayerId) -> bool {
        self.mitglieder.contains_key(id)
    }

    pub fn mitglied(&self, id: &PlayerId) -> Option<&Teilnehmer> {
        self.mitglieder.get(id)
    }

    /// Mitglieder in Beitrittsreihenfolge
    pub fn mitglieder(&self) -> Vec<Teilnehmer> {
        self.sitzordnung
            .iter()
            .filter_map(|id| self.mitglieder.get(id).cloned())
            .collect()
    }

    pub fn mitglieder_ids(&self) -> Vec<PlayerId> {
        self.sitzordnung.clone()
    }

    pub fn anzahl_mitglieder(&self) -> usize {
        self.mitglieder.len()
    }

    pub fn engine(&self) -> Option<&TurnEngine> {
        self.engine.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::NurZugreihenfolge;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn teilnehmer(name: &str) -> Teilnehmer {
        Teilnehmer::new(PlayerId::new(), name)
    }

    #[test]
    fn descriptor_validierung() {
        assert!(SessionDescriptor::oeffentlich("g1", 3).validieren().is_ok());
        assert!(SessionDescriptor::oeffentlich("", 3).validieren().is_err());
        assert!(SessionDescriptor::oeffentlich("x".repeat(25), 3)
            .validieren()
            .is_err());
        assert!(SessionDescriptor::oeffentlich("g1", 1).validieren().is_err());
        assert!(SessionDescriptor::oeffentlich("g1", 6).validieren().is_err());
        assert!(SessionDescriptor::privat("g1", 2, "   ").validieren().is_err());
        assert!(SessionDescriptor::privat("g1", 2, "pw").validieren().is_ok());

        let ohne_passwort = SessionDescriptor {
            passwort: None,
            ..SessionDescriptor::privat("g1", 2, "x")
        };
        assert!(ohne_passwort.validieren().is_err());
    }

    #[test]
    fn neue_sitzung_ist_created() {
        let sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        assert_eq!(sitzung.status(), SessionStatus::Created);
        assert_eq!(sitzung.kapazitaet(), 3);
        assert!(!sitzung.ist_privat());
        assert!(sitzung.passwort_hash().is_none());
    }

    #[test]
    fn private_sitzung_speichert_nur_hash() {
        let sitzung = GameSession::neu(SessionDescriptor::privat("g1", 2, "geheim")).unwrap();
        let hash = sitzung.passwort_hash().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(password::passwort_verifizieren("geheim", hash).unwrap());
        assert!(!format!("{:?}", sitzung).contains("geheim\""));
    }

    #[test]
    fn beitritt_bis_kapazitaet() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 2)).unwrap();
        assert_eq!(sitzung.beitreten(teilnehmer("a")), BeitrittErgebnis::Beigetreten);
        assert_eq!(sitzung.status(), SessionStatus::WaitingForPlayers);
        assert_eq!(sitzung.beitreten(teilnehmer("b")), BeitrittErgebnis::Beigetreten);

        let vorher = sitzung.mitglieder();
        assert_eq!(sitzung.beitreten(teilnehmer("c")), BeitrittErgebnis::Voll);
        assert_eq!(sitzung.mitglieder(), vorher);
        assert_eq!(sitzung.anzahl_mitglieder(), 2);
    }

    #[test]
    fn doppelter_beitritt_kollabiert() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 2)).unwrap();
        let a = teilnehmer("a");
        sitzung.beitreten(a.clone());
        sitzung.beitreten(Teilnehmer::new(a.id, "a2"));
        assert_eq!(sitzung.anzahl_mitglieder(), 1);
        assert_eq!(sitzung.mitglied(&a.id).unwrap().name, "a2");

        // Auch bei voller Sitzung darf ein Mitglied erneut beitreten
        sitzung.beitreten(teilnehmer("b"));
        assert_eq!(sitzung.beitreten(a.clone()), BeitrittErgebnis::Beigetreten);
    }

    #[test]
    fn ersteller_tritt_implizit_bei() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        let p = teilnehmer("p");
        sitzung.ersteller_setzen(p.clone()).unwrap();
        assert!(sitzung.ist_mitglied(&p.id));
        assert!(sitzung.ist_ersteller(&p.id));
        assert_eq!(sitzung.anzahl_mitglieder(), 1);
    }

    #[test]
    fn ersteller_bei_voller_sitzung() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 2)).unwrap();
        sitzung.beitreten(teilnehmer("a"));
        sitzung.beitreten(teilnehmer("b"));
        assert_eq!(
            sitzung.ersteller_setzen(teilnehmer("c")),
            Err(PalaceError::SitzungVoll)
        );
        assert!(sitzung.ersteller().is_none());
    }

    #[test]
    fn starten_braucht_zwei_spieler() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        assert!(sitzung.starten().is_err());

        sitzung.beitreten(teilnehmer("a"));
        assert!(sitzung.starten().is_err());

        sitzung.beitreten(teilnehmer("b"));
        sitzung.starten_mit(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(sitzung.status(), SessionStatus::Running);

        let engine = sitzung.engine().unwrap();
        let mut reihenfolge = engine.zugreihenfolge();
        let mut mitglieder = sitzung.mitglieder_ids();
        reihenfolge.sort();
        mitglieder.sort();
        assert_eq!(reihenfolge, mitglieder);
        assert!(mitglieder.contains(&engine.aktueller_spieler().unwrap()));

        // Zweiter Start ist unzulaessig, Beitritt auch nicht mehr offen
        assert!(sitzung.starten().is_err());
        assert!(!sitzung.status().offen());
    }

    #[test]
    fn beitritt_nach_start_abgelehnt() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 4)).unwrap();
        sitzung.ersteller_setzen(teilnehmer("a")).unwrap();
        sitzung.beitreten(teilnehmer("b"));
        sitzung.starten_mit(&mut StdRng::seed_from_u64(4)).unwrap();

        let c = teilnehmer("c");
        assert_eq!(sitzung.beitreten(c.clone()), BeitrittErgebnis::Geschlossen);
        assert!(!sitzung.ist_mitglied(&c.id));
        assert!(matches!(
            sitzung.ersteller_setzen(c.clone()),
            Err(PalaceError::UngueltigeAktion(_))
        ));

        let mut reihenfolge = sitzung.engine().unwrap().zugreihenfolge();
        let mut mitglieder = sitzung.mitglieder_ids();
        reihenfolge.sort();
        mitglieder.sort();
        assert_eq!(reihenfolge, mitglieder);

        sitzung.beenden();
        assert_eq!(sitzung.beitreten(c), BeitrittErgebnis::Geschlossen);
        assert_eq!(sitzung.anzahl_mitglieder(), 2);
    }

    #[test]
    fn verlassen_beendet_laufendes_spiel() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        let a = teilnehmer("a");
        let b = teilnehmer("b");
        sitzung.ersteller_setzen(a.clone()).unwrap();
        sitzung.beitreten(b.clone());
        sitzung.starten_mit(&mut StdRng::seed_from_u64(2)).unwrap();

        assert!(sitzung.verlassen(&b.id));
        assert!(!sitzung.verlassen(&b.id));
        assert_eq!(sitzung.status(), SessionStatus::Finished);
        // Ersteller bleibt fuer die Anzeige erhalten
        assert!(sitzung.ist_ersteller(&a.id));
    }

    #[test]
    fn verlassen_vor_dem_start() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        let a = teilnehmer("a");
        sitzung.beitreten(a.clone());
        assert!(sitzung.verlassen(&a.id));
        assert_eq!(sitzung.anzahl_mitglieder(), 0);
        assert_eq!(sitzung.status(), SessionStatus::WaitingForPlayers);
    }

    #[test]
    fn aktion_zug_beenden_rotiert() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        sitzung.beitreten(teilnehmer("a"));
        sitzung.beitreten(teilnehmer("b"));
        sitzung.beitreten(teilnehmer("c"));
        sitzung.starten_mit(&mut StdRng::seed_from_u64(3)).unwrap();

        let reihenfolge = sitzung.engine().unwrap().zugreihenfolge();
        let naechster = sitzung
            .aktion(reihenfolge[0], &SpielAktion::ZugBeenden, &NurZugreihenfolge)
            .unwrap();
        assert_eq!(naechster, Some(reihenfolge[1]));
    }

    #[test]
    fn aktion_vor_dem_start_abgelehnt() {
        let mut sitzung = GameSession::neu(SessionDescriptor::oeffentlich("g1", 3)).unwrap();
        let a = teilnehmer("a");
        sitzung.beitreten(a.clone());
        assert!(matches!(
            sitzung.aktion(a.id, &SpielAktion::ZugBeenden, &NurZugreihenfolge),
            Err(PalaceError::UngueltigeAktion(_))
        ));
    }

    #[test]
    fn status_texte() {
        assert_eq!(SessionStatus::WaitingForPlayers.als_text(), "Waiting For Players");
        assert_eq!(SessionStatus::Created.als_text(), "Created");
    }
}
