//! Spieler-Handler – Registrieren, Abmelden, Aufraeumen
//!
//! `spieler_bereinigen` ist der einzige Weg, einen Spieler aus dem System
//! zu entfernen: bei `unregister`, beim Verbindungsende und wenn eine
//! Zustellung an ihn fehlschlug.

use palace_core::PlayerId;
use palace_game::validierung::name_pruefen;
use palace_protocol::{MembershipEvent, PlayerInfo, ServerKind, ServerMessage};
use std::collections::HashSet;

use super::{inhalt_parsen, lobby_handler, registriert, spiel_handler};
use crate::broadcast::ZustellBericht;
use crate::dispatcher::DispatcherContext;
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// `register`: Name pruefen, eintragen, begruessen, Lobby schicken
pub fn handle_register(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let name: String = inhalt_parsen(content)
        .map_err(|_| SignalingError::protokoll("name must be a JSON string"))?;
    name_pruefen(&name, "Name")?;

    let spieler = state
        .spieler
        .registrieren_eindeutig(ctx.verbindung, &name, ctx.sender.clone())?;
    ctx.spieler_id = Some(spieler.id);

    tracing::info!(
        peer = %ctx.peer_addr,
        player_id = %spieler.id,
        name = %spieler.name,
        "Spieler registriert"
    );

    ctx.antworten(ServerMessage::success(format!("Welcome {}!", spieler.name)));
    ctx.antworten(ServerMessage::mit_inhalt(
        ServerKind::AllGames,
        &lobby_handler::lobby(state),
    )?);

    Ok(ZustellBericht::default())
}

/// `unregister`: aus allen Sitzungen austreten und abmelden
pub fn handle_unregister(
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;

    let bericht = spieler_entfernen(state, spieler.id);
    ctx.spieler_id = None;

    ctx.antworten(ServerMessage::success(format!("Goodbye {}!", spieler.name)));
    Ok(bericht)
}

/// Entfernt einen Spieler und alle, an die dabei nicht zugestellt werden
/// konnte. Gibt die Anzahl entfernter Spieler zurueck.
pub fn spieler_bereinigen(state: &SignalingState, id: PlayerId) -> usize {
    let mut offen = vec![id];
    let mut erledigt = HashSet::new();

    while let Some(id) = offen.pop() {
        if !erledigt.insert(id) {
            continue;
        }
        let bericht = spieler_entfernen(state, id);
        offen.extend(bericht.fehlgeschlagen);
    }

    erledigt.len()
}

/// Abmelden, aus allen Sitzungen austreten, verbleibende Mitglieder
/// informieren. Zuerst abmelden, damit keine Verteilung mehr an den
/// Spieler selbst geht.
fn spieler_entfernen(state: &SignalingState, id: PlayerId) -> ZustellBericht {
    let name = state
        .spieler
        .abmelden_spieler(&id)
        .map(|s| s.name)
        .unwrap_or_default();

    let mut bericht = ZustellBericht::default();

    for sitzung_id in state.sessions.spieler_entfernen(&id) {
        let Some(geteilt) = state.sessions.holen(&sitzung_id) else {
            continue;
        };

        let (rest, ansichten) = {
            let sitzung = geteilt.lock();
            let ansichten = if sitzung.engine().is_some() {
                spiel_handler::spielstand(&sitzung).unwrap_or_else(|e| {
                    tracing::warn!(session = %sitzung_id, fehler = %e, "Spielstand nicht serialisierbar");
                    Vec::new()
                })
            } else {
                Vec::new()
            };
            (sitzung.mitglieder_ids(), ansichten)
        };

        let ereignis = MembershipEvent {
            game: sitzung_id.clone(),
            player: PlayerInfo { name: name.clone() },
        };
        match ServerMessage::mit_inhalt(ServerKind::PlayerLeft, &ereignis) {
            Ok(nachricht) => {
                bericht.zusammenfuehren(state.broadcaster.an_gruppe_senden(&rest, nachricht))
            }
            Err(e) => tracing::warn!(fehler = %e, "player_left nicht serialisierbar"),
        }
        bericht.zusammenfuehren(state.broadcaster.zustellen(ansichten));

        tracing::debug!(session = %sitzung_id, player_id = %id, "Spieler aus Sitzung entfernt");
    }

    tracing::info!(player_id = %id, name = %name, "Spieler abgemeldet");
    bericht
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ClientSender;
    use crate::server_state::SignalingConfig;
    use palace_core::ConnectionId;
    use palace_game::{SessionDescriptor, Teilnehmer};
    use palace_protocol::SessionInfo;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn kontext() -> (DispatcherContext, mpsc::Receiver<ServerMessage>) {
        let (sender, rx) = ClientSender::kanal(ConnectionId::new(), 16);
        (
            DispatcherContext::neu("127.0.0.1:4000".parse().unwrap(), sender),
            rx,
        )
    }

    fn state() -> Arc<SignalingState> {
        SignalingState::neu(SignalingConfig::default())
    }

    #[tokio::test]
    async fn register_begruesst_und_schickt_lobby() {
        let state = state();
        state
            .sessions
            .erstellen(SessionDescriptor::oeffentlich("g1", 2))
            .unwrap();
        let (mut ctx, mut rx) = kontext();

        handle_register("\"anna\"", &mut ctx, &state).unwrap();
        assert!(ctx.spieler_id.is_some());

        let willkommen = rx.try_recv().unwrap();
        assert_eq!(willkommen.art, ServerKind::Success);
        assert_eq!(willkommen.content, "Welcome anna!");

        let lobby = rx.try_recv().unwrap();
        assert_eq!(lobby.art, ServerKind::AllGames);
        let spiele: Vec<SessionInfo> = lobby.inhalt().unwrap();
        assert_eq!(spiele.len(), 1);
        assert_eq!(spiele[0].name, "g1");
    }

    #[tokio::test]
    async fn register_lehnt_ungueltige_namen_ab() {
        let state = state();
        let (mut ctx, _rx) = kontext();

        assert!(matches!(
            handle_register("\"\"", &mut ctx, &state),
            Err(SignalingError::Spiel(_))
        ));
        assert!(matches!(
            handle_register("\"a\\u001fb\"", &mut ctx, &state),
            Err(SignalingError::Spiel(_))
        ));
        assert!(matches!(
            handle_register("kein json", &mut ctx, &state),
            Err(SignalingError::Protokoll(_))
        ));
        assert_eq!(state.spieler.anzahl(), 0);
    }

    #[tokio::test]
    async fn register_name_vergeben() {
        let state = state();
        let (mut a, _ra) = kontext();
        let (mut b, _rb) = kontext();

        handle_register("\"anna\"", &mut a, &state).unwrap();
        assert!(matches!(
            handle_register("\"anna\"", &mut b, &state),
            Err(SignalingError::NameVergeben(_))
        ));
    }

    #[tokio::test]
    async fn unregister_verlaesst_sitzungen() {
        let state = state();
        let (mut anna_ctx, _ra) = kontext();
        let (mut ben_ctx, mut rb) = kontext();
        handle_register("\"anna\"", &mut anna_ctx, &state).unwrap();
        handle_register("\"ben\"", &mut ben_ctx, &state).unwrap();
        while rb.try_recv().is_ok() {}

        let anna = anna_ctx.spieler_id.unwrap();
        let ben = ben_ctx.spieler_id.unwrap();
        state
            .sessions
            .erstellen(SessionDescriptor::oeffentlich("g1", 3))
            .unwrap();
        state
            .sessions
            .beitreten("g1", Teilnehmer::new(anna, "anna"))
            .unwrap();
        state
            .sessions
            .beitreten("g1", Teilnehmer::new(ben, "ben"))
            .unwrap();

        handle_unregister(&mut anna_ctx, &state).unwrap();
        assert!(anna_ctx.spieler_id.is_none());
        assert!(state.spieler.nachschlagen(&anna_ctx.verbindung).is_none());
        assert!(!state.sessions.holen("g1").unwrap().lock().ist_mitglied(&anna));

        let nachricht = rb.try_recv().unwrap();
        assert_eq!(nachricht.art, ServerKind::PlayerLeft);
        let ereignis: MembershipEvent = nachricht.inhalt().unwrap();
        assert_eq!(ereignis.player.name, "anna");
    }

    #[tokio::test]
    async fn unregister_ohne_registrierung() {
        let state = state();
        let (mut ctx, _rx) = kontext();
        assert!(matches!(
            handle_unregister(&mut ctx, &state),
            Err(SignalingError::NichtRegistriert)
        ));
    }

    #[tokio::test]
    async fn bereinigen_entfernt_auch_unerreichbare() {
        let state = state();
        let (mut anna_ctx, _ra) = kontext();
        let (mut ben_ctx, rb) = kontext();
        handle_register("\"anna\"", &mut anna_ctx, &state).unwrap();
        handle_register("\"ben\"", &mut ben_ctx, &state).unwrap();

        let anna = anna_ctx.spieler_id.unwrap();
        let ben = ben_ctx.spieler_id.unwrap();
        state
            .sessions
            .erstellen(SessionDescriptor::oeffentlich("g1", 3))
            .unwrap();
        state
            .sessions
            .beitreten("g1", Teilnehmer::new(anna, "anna"))
            .unwrap();
        state
            .sessions
            .beitreten("g1", Teilnehmer::new(ben, "ben"))
            .unwrap();

        // ben ist weg, die Benachrichtigung an ihn schlaegt fehl
        drop(rb);
        let entfernt = spieler_bereinigen(&state, anna);

        assert_eq!(entfernt, 2);
        assert_eq!(state.spieler.anzahl(), 0);
        assert_eq!(state.sessions.holen("g1").unwrap().lock().anzahl_mitglieder(), 0);
    }

    #[tokio::test]
    async fn bereinigen_unbekannt_ist_noop() {
        let state = state();
        assert_eq!(spieler_bereinigen(&state, PlayerId::new()), 1);
        assert_eq!(state.spieler.anzahl(), 0);
    }
}
