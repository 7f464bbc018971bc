//! Lobby-Handler – Spiele anlegen, betreten, verlassen, auflisten
//!
//! Passwoerter werden ausserhalb aller Locks gehasht und geprueft. Eine
//! Sitzung wird zweimal gesperrt: einmal zum Lesen, einmal zum Aendern.
//! Zwischen beiden Sperren kann das Spiel starten; `beitreten` lehnt das
//! dann selbst mit `Geschlossen` ab.

use palace_core::PalaceError;
use palace_game::{password, BeitrittErgebnis, GameSession, SessionDescriptor, Teilnehmer};
use palace_protocol::{
    CreateGameRequest, JoinGameRequest, MembershipEvent, PlayerInfo, ServerKind, ServerMessage,
    SessionInfo, SessionRef,
};

use super::{blockierend, inhalt_parsen, registriert, spiel_handler};
use crate::broadcast::ZustellBericht;
use crate::dispatcher::DispatcherContext;
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Momentaufnahme aller Sitzungen, nach Name sortiert
pub(crate) fn lobby(state: &SignalingState) -> Vec<SessionInfo> {
    let mut spiele: Vec<SessionInfo> = state
        .sessions
        .alle()
        .iter()
        .map(|s| SessionInfo::aus_sitzung(&s.lock()))
        .collect();
    spiele.sort_by(|a, b| a.name.cmp(&b.name));
    spiele
}

/// `create_game`
pub async fn handle_create_game(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;
    let anfrage: CreateGameRequest = inhalt_parsen(content)?;

    let desc = SessionDescriptor {
        id: anfrage.name,
        kapazitaet: anfrage.number_of_players,
        privat: anfrage.private,
        passwort: anfrage.password,
    };
    desc.validieren()?;

    // Vorab-Pruefung spart das Hashing; verbindlich ist erst `einfuegen_neu`
    if state.sessions.holen(&desc.id).is_some() {
        return Err(PalaceError::validierung(format!("Game '{}' already exists", desc.id)).into());
    }

    let mut sitzung = blockierend(move || GameSession::neu(desc)).await?;
    sitzung.ersteller_setzen(Teilnehmer::new(spieler.id, spieler.name.clone()))?;
    let info = SessionInfo::aus_sitzung(&sitzung);
    state.sessions.einfuegen_neu(sitzung)?;

    tracing::info!(
        session = %info.name,
        player_id = %spieler.id,
        kapazitaet = info.number_of_players,
        privat = info.private,
        "Spiel erstellt"
    );

    ctx.antworten(ServerMessage::mit_inhalt(ServerKind::Success, &info)?);
    let neu = ServerMessage::mit_inhalt(ServerKind::NewGame, &info)?;
    Ok(state.broadcaster.an_alle_senden(neu))
}

/// `join_game`
pub async fn handle_join_game(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;
    let anfrage: JoinGameRequest = inhalt_parsen(content)?;
    let geteilt = state.sessions.holen_oder_fehler(&anfrage.name)?;

    let (offen, hash) = {
        let sitzung = geteilt.lock();
        (
            sitzung.status().offen(),
            sitzung.passwort_hash().map(str::to_string),
        )
    };
    if !offen {
        return Err(SignalingError::SitzungGeschlossen(anfrage.name));
    }

    if let Some(hash) = hash {
        let passwort = anfrage
            .password
            .filter(|p| !p.trim().is_empty())
            .ok_or(SignalingError::PasswortFehlt)?;
        let stimmt = blockierend(move || password::passwort_verifizieren(&passwort, &hash)).await?;
        if !stimmt {
            tracing::warn!(session = %anfrage.name, player_id = %spieler.id, "Falsches Passwort");
            return Err(SignalingError::FalschesPasswort);
        }
    }

    let mitglieder = {
        let mut sitzung = geteilt.lock();
        match sitzung.beitreten(Teilnehmer::new(spieler.id, spieler.name.clone())) {
            BeitrittErgebnis::Beigetreten => sitzung.mitglieder_ids(),
            BeitrittErgebnis::Voll => return Err(PalaceError::SitzungVoll.into()),
            BeitrittErgebnis::Geschlossen => {
                return Err(SignalingError::SitzungGeschlossen(anfrage.name))
            }
        }
    };

    tracing::info!(session = %anfrage.name, player_id = %spieler.id, "Spiel beigetreten");

    ctx.antworten(ServerMessage::success("Joined the game successfully!"));
    let ereignis = MembershipEvent {
        game: anfrage.name,
        player: PlayerInfo { name: spieler.name },
    };
    let nachricht = ServerMessage::mit_inhalt(ServerKind::PlayerJoined, &ereignis)?;
    Ok(state.broadcaster.an_gruppe_senden(&mitglieder, nachricht))
}

/// `leave_game`
pub fn handle_leave_game(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;
    let anfrage: SessionRef = inhalt_parsen(content)?;
    let geteilt = state.sessions.holen_oder_fehler(&anfrage.name)?;

    let (rest, ansichten) = {
        let mut sitzung = geteilt.lock();
        if !sitzung.verlassen(&spieler.id) {
            return Err(SignalingError::KeinMitglied {
                spieler: spieler.id,
                sitzung: anfrage.name,
            });
        }
        let ansichten = if sitzung.engine().is_some() {
            spiel_handler::spielstand(&sitzung)?
        } else {
            Vec::new()
        };
        (sitzung.mitglieder_ids(), ansichten)
    };

    tracing::info!(session = %anfrage.name, player_id = %spieler.id, "Spiel verlassen");

    ctx.antworten(ServerMessage::success(format!("Left game {}", anfrage.name)));
    let ereignis = MembershipEvent {
        game: anfrage.name,
        player: PlayerInfo { name: spieler.name },
    };
    let nachricht = ServerMessage::mit_inhalt(ServerKind::PlayerLeft, &ereignis)?;

    let mut bericht = state.broadcaster.an_gruppe_senden(&rest, nachricht);
    bericht.zusammenfuehren(state.broadcaster.zustellen(ansichten));
    Ok(bericht)
}

/// `all_games`
pub fn handle_all_games(
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    ctx.antworten(ServerMessage::mit_inhalt(ServerKind::Success, &lobby(state))?);
    Ok(ZustellBericht::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ClientSender;
    use crate::handlers::spieler_handler::handle_register;
    use crate::server_state::SignalingConfig;
    use palace_core::ConnectionId;
    use palace_game::SessionStatus;
    use palace_protocol::ErrorCode;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn state() -> Arc<SignalingState> {
        SignalingState::neu(SignalingConfig::default())
    }

    /// Registriert einen Spieler und leert seine Queue
    fn spieler(
        state: &SignalingState,
        name: &str,
    ) -> (DispatcherContext, mpsc::Receiver<ServerMessage>) {
        let (sender, mut rx) = ClientSender::kanal(ConnectionId::new(), 32);
        let mut ctx = DispatcherContext::neu("127.0.0.1:4000".parse().unwrap(), sender);
        handle_register(&format!("\"{name}\""), &mut ctx, state).unwrap();
        while rx.try_recv().is_ok() {}
        (ctx, rx)
    }

    fn erstellen_json(name: &str, anzahl: usize, passwort: Option<&str>) -> String {
        serde_json::to_string(&CreateGameRequest {
            name: name.to_string(),
            number_of_players: anzahl,
            private: passwort.is_some(),
            password: passwort.map(str::to_string),
        })
        .unwrap()
    }

    fn beitreten_json(name: &str, passwort: Option<&str>) -> String {
        serde_json::to_string(&JoinGameRequest {
            name: name.to_string(),
            password: passwort.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn erstellen_antwortet_und_verteilt() {
        let state = state();
        let (mut anna, mut ra) = spieler(&state, "anna");
        let (_ben, mut rb) = spieler(&state, "ben");

        let bericht = handle_create_game(&erstellen_json("g1", 3, None), &mut anna, &state)
            .await
            .unwrap();
        assert!(bericht.ist_vollstaendig());

        let antwort = ra.try_recv().unwrap();
        assert_eq!(antwort.art, ServerKind::Success);
        let info: SessionInfo = antwort.inhalt().unwrap();
        assert_eq!(info.name, "g1");
        assert_eq!(info.creator.unwrap().name, "anna");
        assert_eq!(info.status, "Waiting For Players");

        // new_game geht an alle, auch an den Ersteller
        assert_eq!(ra.try_recv().unwrap().art, ServerKind::NewGame);
        assert_eq!(rb.try_recv().unwrap().art, ServerKind::NewGame);

        let sitzung = state.sessions.holen("g1").unwrap();
        assert!(sitzung.lock().ist_mitglied(&anna.spieler_id.unwrap()));
    }

    #[tokio::test]
    async fn erstellen_validiert() {
        let state = state();
        let (mut anna, _ra) = spieler(&state, "anna");

        for json in [
            erstellen_json("", 3, None),
            erstellen_json("g1", 1, None),
            erstellen_json("g1", 6, None),
            erstellen_json("g1", 3, Some("   ")),
            erstellen_json(&"x".repeat(25), 3, None),
        ] {
            let fehler = handle_create_game(&json, &mut anna, &state)
                .await
                .unwrap_err();
            assert_eq!(fehler.code(), ErrorCode::InvalidRequest, "{json}");
        }
        assert_eq!(state.sessions.anzahl(), 0);
    }

    #[tokio::test]
    async fn erstellen_doppelter_name() {
        let state = state();
        let (mut anna, _ra) = spieler(&state, "anna");
        handle_create_game(&erstellen_json("g1", 3, None), &mut anna, &state)
            .await
            .unwrap();
        let fehler = handle_create_game(&erstellen_json("g1", 4, None), &mut anna, &state)
            .await
            .unwrap_err();
        assert_eq!(fehler.code(), ErrorCode::InvalidRequest);
        assert_eq!(state.sessions.holen("g1").unwrap().lock().kapazitaet(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn gleichzeitiges_erstellen_nur_einmal() {
        let state = state();
        let (_zuschauer, mut rz) = spieler(&state, "zuschauer");

        for runde in 0..5 {
            let name = format!("g{runde}");
            let aufgaben: Vec<_> = ["anna", "ben"]
                .into_iter()
                .map(|wer| {
                    let state = Arc::clone(&state);
                    let (mut ctx, _rx) = spieler(&state, &format!("{wer}{runde}"));
                    let json = erstellen_json(&name, 3, Some("geheim"));
                    tokio::spawn(async move {
                        handle_create_game(&json, &mut ctx, &state).await.is_ok()
                    })
                })
                .collect();

            let mut erfolgreich = 0;
            for aufgabe in aufgaben {
                if aufgabe.await.unwrap() {
                    erfolgreich += 1;
                }
            }
            assert_eq!(erfolgreich, 1, "Runde {runde}");
        }
        assert_eq!(state.sessions.anzahl(), 5);

        let mut neue_spiele = 0;
        while let Ok(nachricht) = rz.try_recv() {
            if nachricht.art == ServerKind::NewGame {
                neue_spiele += 1;
            }
        }
        assert_eq!(neue_spiele, 5);
    }

    #[tokio::test]
    async fn erstellen_ohne_registrierung() {
        let state = state();
        let (sender, _rx) = ClientSender::kanal(ConnectionId::new(), 4);
        let mut ctx = DispatcherContext::neu("127.0.0.1:4000".parse().unwrap(), sender);
        assert!(matches!(
            handle_create_game(&erstellen_json("g1", 3, None), &mut ctx, &state).await,
            Err(SignalingError::NichtRegistriert)
        ));
    }

    #[tokio::test]
    async fn beitreten_benachrichtigt_mitglieder() {
        let state = state();
        let (mut anna, mut ra) = spieler(&state, "anna");
        let (mut ben, mut rb) = spieler(&state, "ben");
        let (_cora, mut rc) = spieler(&state, "cora");

        handle_create_game(&erstellen_json("g1", 3, None), &mut anna, &state)
            .await
            .unwrap();
        while ra.try_recv().is_ok() {}
        while rb.try_recv().is_ok() {}
        while rc.try_recv().is_ok() {}

        handle_join_game(&beitreten_json("g1", None), &mut ben, &state)
            .await
            .unwrap();

        let antwort = rb.try_recv().unwrap();
        assert_eq!(antwort.content, "Joined the game successfully!");
        let ereignis: MembershipEvent = ra.try_recv().unwrap().inhalt().unwrap();
        assert_eq!(ereignis.player.name, "ben");
        assert_eq!(rb.try_recv().unwrap().art, ServerKind::PlayerJoined);
        // Nicht-Mitglieder bekommen nichts
        assert!(rc.try_recv().is_err());
    }

    #[tokio::test]
    async fn beitreten_voll_und_unbekannt() {
        let state = state();
        let (mut anna, _ra) = spieler(&state, "anna");
        let (mut ben, _rb) = spieler(&state, "ben");
        let (mut cora, _rc) = spieler(&state, "cora");

        handle_create_game(&erstellen_json("g1", 2, None), &mut anna, &state)
            .await
            .unwrap();
        handle_join_game(&beitreten_json("g1", None), &mut ben, &state)
            .await
            .unwrap();

        let voll = handle_join_game(&beitreten_json("g1", None), &mut cora, &state)
            .await
            .unwrap_err();
        assert_eq!(voll.code(), ErrorCode::GameFull);

        let unbekannt = handle_join_game(&beitreten_json("g9", None), &mut cora, &state)
            .await
            .unwrap_err();
        assert_eq!(unbekannt.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn privates_spiel_braucht_passwort() {
        let state = state();
        let (mut anna, _ra) = spieler(&state, "anna");
        let (mut ben, _rb) = spieler(&state, "ben");

        handle_create_game(&erstellen_json("geheim", 3, Some("pw")), &mut anna, &state)
            .await
            .unwrap();

        assert!(matches!(
            handle_join_game(&beitreten_json("geheim", None), &mut ben, &state).await,
            Err(SignalingError::PasswortFehlt)
        ));
        assert!(matches!(
            handle_join_game(&beitreten_json("geheim", Some("falsch")), &mut ben, &state).await,
            Err(SignalingError::FalschesPasswort)
        ));
        handle_join_game(&beitreten_json("geheim", Some("pw")), &mut ben, &state)
            .await
            .unwrap();
        assert_eq!(
            state.sessions.holen("geheim").unwrap().lock().anzahl_mitglieder(),
            2
        );
    }

    #[tokio::test]
    async fn beitreten_laufendes_spiel_abgelehnt() {
        let state = state();
        let (mut anna, _ra) = spieler(&state, "anna");
        let (mut ben, _rb) = spieler(&state, "ben");
        let (mut cora, _rc) = spieler(&state, "cora");

        handle_create_game(&erstellen_json("g1", 3, None), &mut anna, &state)
            .await
            .unwrap();
        handle_join_game(&beitreten_json("g1", None), &mut ben, &state)
            .await
            .unwrap();
        state.sessions.holen("g1").unwrap().lock().starten().unwrap();

        assert!(matches!(
            handle_join_game(&beitreten_json("g1", None), &mut cora, &state).await,
            Err(SignalingError::SitzungGeschlossen(_))
        ));
    }

    #[tokio::test]
    async fn verlassen_benachrichtigt_rest() {
        let state = state();
        let (mut anna, mut ra) = spieler(&state, "anna");
        let (mut ben, mut rb) = spieler(&state, "ben");

        handle_create_game(&erstellen_json("g1", 3, None), &mut anna, &state)
            .await
            .unwrap();
        handle_join_game(&beitreten_json("g1", None), &mut ben, &state)
            .await
            .unwrap();
        while ra.try_recv().is_ok() {}
        while rb.try_recv().is_ok() {}

        let json = serde_json::to_string(&SessionRef { name: "g1".into() }).unwrap();
        handle_leave_game(&json, &mut ben, &state).unwrap();

        assert_eq!(rb.try_recv().unwrap().art, ServerKind::Success);
        let ereignis: MembershipEvent = ra.try_recv().unwrap().inhalt().unwrap();
        assert_eq!(ereignis.player.name, "ben");

        // Zweites Verlassen: kein Mitglied mehr
        let fehler = handle_leave_game(&json, &mut ben, &state).unwrap_err();
        assert_eq!(fehler.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn verlassen_waehrend_spiel_beendet_es() {
        let state = state();
        let (mut anna, mut ra) = spieler(&state, "anna");
        let (mut ben, _rb) = spieler(&state, "ben");

        handle_create_game(&erstellen_json("g1", 2, None), &mut anna, &state)
            .await
            .unwrap();
        handle_join_game(&beitreten_json("g1", None), &mut ben, &state)
            .await
            .unwrap();
        state.sessions.holen("g1").unwrap().lock().starten().unwrap();
        while ra.try_recv().is_ok() {}

        let json = serde_json::to_string(&SessionRef { name: "g1".into() }).unwrap();
        handle_leave_game(&json, &mut ben, &state).unwrap();

        assert_eq!(
            state.sessions.holen("g1").unwrap().lock().status(),
            SessionStatus::Finished
        );
        assert_eq!(ra.try_recv().unwrap().art, ServerKind::PlayerLeft);
        assert_eq!(ra.try_recv().unwrap().art, ServerKind::GameState);
    }

    #[tokio::test]
    async fn lobby_sortiert_ohne_passwoerter() {
        let state = state();
        let (mut anna, mut ra) = spieler(&state, "anna");
        handle_create_game(&erstellen_json("zeta", 2, Some("pw")), &mut anna, &state)
            .await
            .unwrap();
        handle_create_game(&erstellen_json("alpha", 2, None), &mut anna, &state)
            .await
            .unwrap();
        while ra.try_recv().is_ok() {}

        handle_all_games(&mut anna, &state).unwrap();
        let antwort = ra.try_recv().unwrap();
        assert!(!antwort.content.contains("argon2"));
        let spiele: Vec<SessionInfo> = antwort.inhalt().unwrap();
        let namen: Vec<_> = spiele.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(namen, ["alpha", "zeta"]);
        assert!(spiele[1].private);
    }
}
