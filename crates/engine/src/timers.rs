//! Aktivitaets-Erkennung – Stille- und Dauersprecher-Timer
//!
//! Beide Timer feuern auf eigenen Tasks und pruefen beim Feuern erneut
//! ob ihr Raum und Ziel noch existieren: ein Timer der einen geloeschten
//! Raum vorfindet ist ein stiller No-Op.

use podium_audio::TimerKey;
use podium_core::types::{ParticipantId, RoomId, TriggerReason};
use podium_protocol::events::ServerEvent;
use std::sync::Arc;

use crate::orchestrator;
use crate::pipeline;
use crate::state::EngineState;

/// Hinweistext der Stille-Meldung an den Raum
const STILLE_HINWEIS: &str = "The room has been quiet for a while.";

/// Gespraechs-Aufhaenger wenn die KI die Stille bricht ohne Transkript
const STILLE_AUFHAENGER: &str = "The conversation has gone quiet.";

// ---------------------------------------------------------------------------
// Stille
// ---------------------------------------------------------------------------

/// Stellt den Stille-Timer eines Raums (neu) scharf
pub fn stille_timer_stellen(state: &Arc<EngineState>, raum: RoomId) {
    let timeout = state.config.stille_timeout;
    let zustand = Arc::clone(state);
    state.scheduler.scharf_stellen(
        TimerKey::Stille(raum.clone()),
        timeout,
        async move { bei_stille(zustand, raum).await },
    );
}

/// Laeuft wenn der Raum `stille_timeout` lang ohne Sprecher war
///
/// Verarbeitet zuerst das gepufferte Audio des letzten Sprechers, wartet
/// dann die Gnadenfrist ab und laesst die KI einspringen falls der Raum
/// immer noch still ist.
async fn bei_stille(state: Arc<EngineState>, raum: RoomId) {
    if !state.raeume.existiert(&raum) {
        return;
    }
    tracing::debug!(raum = %raum, "Stille erkannt");

    if let Some(ziel) = state.raeume.stille_ziel(&raum) {
        pipeline::verarbeiten(Arc::clone(&state), raum.clone(), ziel, TriggerReason::Silence)
            .await;
    }

    // Gnadenfrist: hat inzwischen jemand zu sprechen begonnen, schweigt die KI
    tokio::time::sleep(state.config.stille_gnadenfrist).await;
    if !state.raeume.existiert(&raum) || state.raeume.spricht_jemand(&raum) {
        return;
    }

    state.broadcaster.an_raum_senden(
        &raum,
        ServerEvent::SystemNotice {
            message: STILLE_HINWEIS.to_string(),
        },
    );
    orchestrator::antworten(&state, raum, STILLE_AUFHAENGER, TriggerReason::Silence);
}

// ---------------------------------------------------------------------------
// Dauersprecher
// ---------------------------------------------------------------------------

/// Stellt den Dauersprecher-Timer eines Teilnehmers (neu) scharf
pub fn dauersprecher_timer_stellen(
    state: &Arc<EngineState>,
    raum: RoomId,
    teilnehmer: ParticipantId,
) {
    let intervall = state.config.dauersprecher_intervall;
    let zustand = Arc::clone(state);
    state.scheduler.scharf_stellen(
        TimerKey::Dauersprecher(raum.clone(), teilnehmer.clone()),
        intervall,
        async move { bei_dauersprecher(zustand, raum, teilnehmer).await },
    );
}

/// Laeuft alle `dauersprecher_intervall` solange der Teilnehmer spricht
///
/// Transkribiert das bis dahin gepufferte Audio als Zwischenstand und
/// stellt sich selbst neu scharf wenn der Teilnehmer weiterspricht.
async fn bei_dauersprecher(state: Arc<EngineState>, raum: RoomId, teilnehmer: ParticipantId) {
    if !state.raeume.teilnehmer_existiert(&raum, &teilnehmer) {
        return;
    }
    tracing::debug!(raum = %raum, teilnehmer = %teilnehmer, "Dauersprecher-Intervall");

    // Vor der Verarbeitung neu stellen: die Kadenz bleibt das reine
    // Intervall, unabhaengig von der Transkriptionsdauer. Hoert der
    // Teilnehmer waehrenddessen auf, bricht der Dispatcher den Timer ab.
    if state.raeume.spricht(&raum, &teilnehmer) {
        dauersprecher_timer_stellen(&state, raum.clone(), teilnehmer.clone());
    }

    pipeline::verarbeiten(state, raum, teilnehmer, TriggerReason::ContinuousSpeech).await;
}
