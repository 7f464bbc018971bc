//! Spiel-Handler – Starten und Spielaktionen
//!
//! Nach jeder Zustandsaenderung bekommt jedes Mitglied seinen eigenen
//! `game_state`. Die Ansichten werden unter dem Sitzungs-Lock gebaut und
//! nach dessen Freigabe verteilt.

use palace_core::PlayerId;
use palace_game::{GameSession, SpielAktion};
use palace_protocol::{GameView, PlayCardRequest, ServerKind, ServerMessage, SessionRef};

use super::{inhalt_parsen, registriert};
use crate::broadcast::ZustellBericht;
use crate::dispatcher::DispatcherContext;
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Je Mitglied eine eigene `game_state`-Nachricht
pub(crate) fn spielstand(
    sitzung: &GameSession,
) -> SignalingResult<Vec<(PlayerId, ServerMessage)>> {
    sitzung
        .mitglieder_ids()
        .into_iter()
        .map(|id| {
            let ansicht = GameView::fuer_spieler(sitzung, id);
            Ok((id, ServerMessage::mit_inhalt(ServerKind::GameState, &ansicht)?))
        })
        .collect()
}

/// `start_game`: nur der Ersteller darf starten
pub fn handle_start_game(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;
    let anfrage: SessionRef = inhalt_parsen(content)?;
    let geteilt = state.sessions.holen_oder_fehler(&anfrage.name)?;

    let ansichten = {
        let mut sitzung = geteilt.lock();
        if !sitzung.ist_mitglied(&spieler.id) {
            return Err(SignalingError::KeinMitglied {
                spieler: spieler.id,
                sitzung: anfrage.name,
            });
        }
        if !sitzung.ist_ersteller(&spieler.id) {
            return Err(SignalingError::KeinErsteller);
        }
        sitzung.starten()?;
        spielstand(&sitzung)?
    };

    tracing::info!(
        session = %anfrage.name,
        player_id = %spieler.id,
        spieler = ansichten.len(),
        "Spiel gestartet"
    );

    Ok(state.broadcaster.zustellen(ansichten))
}

/// `play_card`
pub fn handle_play_card(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let anfrage: PlayCardRequest = inhalt_parsen(content)?;
    aktion_ausfuehren(
        ctx,
        state,
        &anfrage.name,
        SpielAktion::Ablegen {
            karte: anfrage.card,
        },
    )
}

/// `end_turn`
pub fn handle_end_turn(
    content: &str,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> SignalingResult<ZustellBericht> {
    let anfrage: SessionRef = inhalt_parsen(content)?;
    aktion_ausfuehren(ctx, state, &anfrage.name, SpielAktion::ZugBeenden)
}

fn aktion_ausfuehren(
    ctx: &DispatcherContext,
    state: &SignalingState,
    sitzung_id: &str,
    aktion: SpielAktion,
) -> SignalingResult<ZustellBericht> {
    let spieler = registriert(ctx, state)?;
    let geteilt = state.sessions.holen_oder_fehler(sitzung_id)?;

    let (naechster, ansichten) = {
        let mut sitzung = geteilt.lock();
        if !sitzung.ist_mitglied(&spieler.id) {
            return Err(SignalingError::KeinMitglied {
                spieler: spieler.id,
                sitzung: sitzung_id.to_string(),
            });
        }
        let naechster = sitzung.aktion(spieler.id, &aktion, state.regeln.as_ref())?;
        (naechster, spielstand(&sitzung)?)
    };

    tracing::debug!(
        session = %sitzung_id,
        player_id = %spieler.id,
        aktion = ?aktion,
        naechster = ?naechster,
        "Spielaktion angewendet"
    );

    Ok(state.broadcaster.zustellen(ansichten))
}
