//! KI-Orchestrierung – waehlt den Antwortenden und stellt die Antwort zu
//!
//! Die Antwort wird sofort generiert, aber erst nach einer zufaelligen
//! Verzoegerung (2–5 s) zugestellt, damit die KI nicht unnatuerlich
//! schnell reagiert. Die Zustellung laeuft als abbrechbarer Timer: wird
//! der Raum vorher geloescht, raeumt `raum_abbrechen` sie mit ab.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use podium_audio::TimerKey;
use podium_core::types::{RoomId, TriggerReason};
use podium_protocol::events::ServerEvent;
use std::sync::Arc;

use crate::state::EngineState;

/// Plant eine KI-Antwort auf die gegebene Aeusserung
///
/// Waehlt gleichverteilt einen KI-Teilnehmer des Raums; ohne
/// KI-Teilnehmer passiert nichts. Scheitert die Synthese bei der
/// Zustellung, degradiert die Antwort zu reinem Text (`audio: null`).
pub fn antworten(
    state: &Arc<EngineState>,
    raum: RoomId,
    quelle_text: &str,
    ausloeser: TriggerReason,
) {
    let kis = state.raeume.ki_teilnehmer(&raum);
    if kis.is_empty() {
        tracing::debug!(raum = %raum, "Keine KI-Teilnehmer – keine Antwort");
        return;
    }

    let wahl = &kis[state.zufall.index(kis.len())];
    let text = state
        .antworten
        .antwort_generieren(quelle_text, wahl.personality);
    let verzoegerung = state.zufall.dauer_zwischen(
        state.config.antwort_verzoegerung_min,
        state.config.antwort_verzoegerung_max,
    );

    tracing::info!(
        raum = %raum,
        ki = %wahl.id,
        verzoegerung_ms = verzoegerung.as_millis() as u64,
        ausloeser = ?ausloeser,
        "KI-Antwort geplant"
    );

    let seq = state.naechste_antwort_seq();
    let schluessel = TimerKey::AntwortVerzoegerung(raum.clone(), seq);
    let scheduler = state.scheduler.clone();
    let state = Arc::clone(state);
    let ki_id = wahl.id.clone();

    scheduler.scharf_stellen(schluessel, verzoegerung, async move {
        // Raum oder KI koennen waehrend der Verzoegerung verschwunden sein
        if !state.raeume.teilnehmer_existiert(&raum, &ki_id) {
            tracing::debug!(raum = %raum, ki = %ki_id, "KI-Antwort verfallen (Raum oder KI weg)");
            return;
        }

        let audio = match state.synthese.synthetisieren(&text).await {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                tracing::warn!(
                    raum = %raum,
                    ki = %ki_id,
                    fehler = %e,
                    "Synthese fehlgeschlagen – Antwort nur als Text"
                );
                None
            }
        };

        let zugestellt = state.broadcaster.an_raum_senden(
            &raum,
            ServerEvent::AiReply {
                from: ki_id.clone(),
                message: text,
                audio,
                trigger: ausloeser,
                timestamp: Utc::now(),
            },
        );
        tracing::debug!(raum = %raum, ki = %ki_id, zugestellt, "KI-Antwort zugestellt");
    });
}
