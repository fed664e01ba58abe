//! Transkriptions-Pipeline – vom Audio-Puffer zum verteilten Transkript
//!
//! Entleert den Puffer eines Teilnehmers, transkribiert die Fragmente
//! und verteilt das Ergebnis. Der Puffer bleibt waehrend der
//! Transkription gesperrt und wird IMMER freigegeben, auch bei
//! Fehlschlag – sonst wuerde der Teilnehmer dauerhaft stumm.

use podium_core::types::{ParticipantId, RoomId, TriggerReason};
use podium_protocol::events::ServerEvent;
use std::sync::Arc;

use crate::orchestrator;
use crate::state::EngineState;

/// Verarbeitet die gepufferten Fragmente eines Teilnehmers
///
/// Leerer oder gesperrter Puffer: stiller No-Op. Leeres Transkript
/// (Rauschen, Atem): kein Broadcast, keine KI-Antwort.
pub async fn verarbeiten(
    state: Arc<EngineState>,
    raum: RoomId,
    teilnehmer: ParticipantId,
    ausloeser: TriggerReason,
) {
    if !state.raeume.teilnehmer_existiert(&raum, &teilnehmer) {
        tracing::debug!(raum = %raum, teilnehmer = %teilnehmer, "Verarbeitung verfallen");
        return;
    }

    let chunks = match state.puffer.entleeren(&raum, &teilnehmer) {
        Some(c) => c,
        None => return,
    };
    let daten: Vec<u8> = chunks.into_iter().flat_map(|c| c.daten).collect();
    tracing::debug!(
        raum = %raum,
        teilnehmer = %teilnehmer,
        bytes = daten.len(),
        ausloeser = ?ausloeser,
        "Transkription gestartet"
    );

    let ergebnis = state
        .transkription
        .transkribieren(&daten, state.config.sprache.as_deref())
        .await;

    // Sperre immer aufheben, auch bei Fehlschlag
    state.puffer.freigeben(&raum, &teilnehmer);

    let text = match ergebnis {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                raum = %raum,
                teilnehmer = %teilnehmer,
                fehler = %e,
                "Transkription fehlgeschlagen"
            );
            return;
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        tracing::debug!(raum = %raum, teilnehmer = %teilnehmer, "Leeres Transkript verworfen");
        return;
    }

    state.broadcaster.an_raum_senden(
        &raum,
        ServerEvent::TranscriptBroadcast {
            participant_id: teilnehmer.clone(),
            text: text.clone(),
            trigger: ausloeser,
        },
    );

    orchestrator::antworten(&state, raum, &text, ausloeser);
}
