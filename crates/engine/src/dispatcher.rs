//! Ereignis-Dispatcher – routet Client-Ereignisse an die richtigen Handler
//!
//! Der Dispatcher ist zustandslos; der gesamte Sitzungszustand lebt im
//! `EngineState`. Ereignisse fuer unbekannte Raeume oder Teilnehmer sind
//! geloggte No-Ops – ein Client mit veraltetem Zustand darf den Server
//! nicht aus dem Tritt bringen.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use podium_core::types::{ConnectionId, ParticipantId, RoomId, TriggerReason};
use podium_protocol::events::{ClientEvent, ParticipantDescriptor, ServerEvent};
use podium_rooms::Participant;
use std::sync::Arc;

use crate::state::EngineState;
use crate::timers;
use podium_audio::TimerKey;

/// Zentraler Ereignis-Dispatcher
///
/// Eine Instanz pro Verbindung; teilt den `EngineState` mit allen anderen.
pub struct EventDispatcher {
    state: Arc<EngineState>,
}

impl EventDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Client-Ereignis
    pub async fn dispatch(&self, ereignis: ClientEvent, verbindung: ConnectionId) {
        match ereignis {
            ClientEvent::Join {
                room_id,
                participant,
                config_label,
            } => self.handle_join(room_id, participant, config_label, verbindung),

            ClientEvent::Leave {
                room_id,
                participant_id,
            } => self.handle_leave(room_id, participant_id, verbindung),

            ClientEvent::MuteToggle {
                room_id,
                participant_id,
                muted,
            } => self.handle_mute(room_id, participant_id, muted),

            ClientEvent::SpeakingStatus {
                room_id,
                participant_id,
                speaking,
                audio_level,
            } => self.handle_speaking(room_id, participant_id, speaking, audio_level),

            ClientEvent::AudioChunk {
                room_id,
                participant_id,
                audio,
                timestamp: _,
            } => self.handle_audio_chunk(room_id, participant_id, audio),

            ClientEvent::TranscriptionText {
                room_id,
                participant_id,
                text,
            } => self.handle_transcription_text(room_id, participant_id, text, verbindung),

            ClientEvent::SignalRelay {
                room_id,
                signal_type,
                payload,
                from_id,
                target_id,
            } => self.handle_signal_relay(room_id, signal_type, payload, from_id, target_id, verbindung),
        }
    }

    /// Raeumt beim Verbindungsende auf (implizites Leave)
    pub fn verbindung_getrennt(&self, verbindung: ConnectionId) {
        if let Some(raum) = self.state.broadcaster.raum_von_verbindung(&verbindung) {
            if let Some(entfernt) = self
                .state
                .raeume
                .verlassen_nach_verbindung(&raum, &verbindung)
            {
                self.teilnehmer_aufraeumen(&raum, &entfernt.id, &verbindung);
            }
        }
        self.state.broadcaster.verbindung_entfernen(&verbindung);
    }

    // -----------------------------------------------------------------------
    // Handler
    // -----------------------------------------------------------------------

    fn handle_join(
        &self,
        raum: RoomId,
        beschreibung: ParticipantDescriptor,
        config_label: Option<String>,
        verbindung: ConnectionId,
    ) {
        self.state
            .raeume
            .raum_erstellen_oder_holen(&raum, beschreibung.topic, config_label);

        let teilnehmer = Participant::mensch(beschreibung.name, beschreibung.avatar, verbindung);
        let info = teilnehmer.info();
        let snapshot = match self.state.raeume.beitreten(&raum, teilnehmer) {
            Some(s) => s,
            None => return,
        };

        self.state.broadcaster.raum_beitreten(verbindung, raum.clone());

        // Beitritt ist Aktivitaet: ein schlafender Stille-Timer verfaellt
        self.state.scheduler.abbrechen(&TimerKey::Stille(raum.clone()));

        self.state.broadcaster.an_raum_ausser_senden(
            &raum,
            &verbindung,
            ServerEvent::ParticipantJoined { participant: info },
        );
        self.state
            .broadcaster
            .an_raum_senden(&raum, ServerEvent::RoomSnapshot { room: snapshot });
    }

    fn handle_leave(&self, raum: RoomId, teilnehmer: ParticipantId, verbindung: ConnectionId) {
        if self.state.raeume.verlassen(&raum, &teilnehmer).is_none() {
            tracing::debug!(raum = %raum, teilnehmer = %teilnehmer, "Leave fuer unbekannten Teilnehmer");
            return;
        }
        self.teilnehmer_aufraeumen(&raum, &teilnehmer, &verbindung);
    }

    /// Gemeinsamer Aufraeumpfad fuer Leave und Disconnect
    fn teilnehmer_aufraeumen(
        &self,
        raum: &RoomId,
        teilnehmer: &ParticipantId,
        verbindung: &ConnectionId,
    ) {
        self.state.scheduler.teilnehmer_abbrechen(raum, teilnehmer);
        self.state.puffer.entfernen(raum, teilnehmer);
        self.state.broadcaster.raum_verlassen(verbindung);

        self.state.broadcaster.an_raum_senden(
            raum,
            ServerEvent::ParticipantLeft {
                participant_id: teilnehmer.clone(),
            },
        );

        if self.state.raeume.raum_entfernen_wenn_leer(raum) {
            self.state.raum_aufraeumen(raum);
        } else if let Some(snapshot) = self.state.raeume.raum(raum) {
            self.state
                .broadcaster
                .an_raum_senden(raum, ServerEvent::RoomSnapshot { room: snapshot });
        }
    }

    fn handle_mute(&self, raum: RoomId, teilnehmer: ParticipantId, muted: bool) {
        if !self.state.raeume.stumm_setzen(&raum, &teilnehmer, muted) {
            return;
        }
        self.state.broadcaster.an_raum_senden(
            &raum,
            ServerEvent::MuteUpdated {
                participant_id: teilnehmer,
                muted,
            },
        );
    }

    fn handle_speaking(
        &self,
        raum: RoomId,
        teilnehmer: ParticipantId,
        speaking: bool,
        audio_level: f32,
    ) {
        let wechsel = match self
            .state
            .raeume
            .sprechstatus_setzen(&raum, &teilnehmer, speaking, audio_level)
        {
            Some(w) => w,
            None => return,
        };

        self.state.broadcaster.an_raum_senden(
            &raum,
            ServerEvent::SpeakingUpdated {
                participant_id: teilnehmer.clone(),
                speaking,
                audio_level,
            },
        );

        if speaking {
            // Verdraengte Sprecher verlieren ihren Dauersprecher-Timer
            if let Some(snapshot) = self.state.raeume.raum(&raum) {
                for anderer in snapshot.participants.iter().filter(|p| p.id != teilnehmer) {
                    self.state.scheduler.teilnehmer_abbrechen(&raum, &anderer.id);
                }
            }
            // Nur der Uebergang still -> sprechend startet das Intervall;
            // Pegel-Updates eines laufenden Sprechers lassen es weiterlaufen
            if !wechsel.selbst_vorher {
                timers::dauersprecher_timer_stellen(&self.state, raum.clone(), teilnehmer);
            }
        } else {
            self.state.scheduler.teilnehmer_abbrechen(&raum, &teilnehmer);
        }

        if wechsel.jemand_nachher {
            self.state.scheduler.abbrechen(&TimerKey::Stille(raum));
        } else {
            timers::stille_timer_stellen(&self.state, raum);
        }
    }

    fn handle_audio_chunk(&self, raum: RoomId, teilnehmer: ParticipantId, audio: String) {
        if !self.state.raeume.teilnehmer_existiert(&raum, &teilnehmer) {
            tracing::debug!(raum = %raum, teilnehmer = %teilnehmer, "Audio fuer unbekannten Teilnehmer");
            return;
        }
        let daten = match BASE64.decode(audio.as_bytes()) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    raum = %raum,
                    teilnehmer = %teilnehmer,
                    fehler = %e,
                    "Ungueltiges base64-Audio verworfen"
                );
                return;
            }
        };
        self.state.puffer.chunk_anhaengen(&raum, &teilnehmer, daten);
    }

    fn handle_transcription_text(
        &self,
        raum: RoomId,
        teilnehmer: ParticipantId,
        text: String,
        verbindung: ConnectionId,
    ) {
        if !self.state.raeume.teilnehmer_existiert(&raum, &teilnehmer) {
            return;
        }
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        self.state.broadcaster.an_raum_ausser_senden(
            &raum,
            &verbindung,
            ServerEvent::TranscriptBroadcast {
                participant_id: teilnehmer,
                text: text.clone(),
                trigger: TriggerReason::UserInitiated,
            },
        );

        // Client-Transkripte loesen die KI nur mit einer gewissen
        // Wahrscheinlichkeit aus, sonst redet sie staendig dazwischen
        if self.state.zufall.wahrscheinlichkeit()
            < self.state.config.sekundaer_antwort_wahrscheinlichkeit
        {
            crate::orchestrator::antworten(&self.state, raum, &text, TriggerReason::UserInitiated);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_signal_relay(
        &self,
        raum: RoomId,
        signal_type: String,
        payload: serde_json::Value,
        from_id: ParticipantId,
        target_id: Option<ParticipantId>,
        verbindung: ConnectionId,
    ) {
        self.state.broadcaster.an_raum_ausser_senden(
            &raum,
            &verbindung,
            ServerEvent::SignalRelay {
                signal_type,
                payload,
                from_id,
                target_id,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use podium_ai::{AiError, AntwortGenerator, SprachSynthese, Transkription, ZufallsQuelle};
    use podium_core::types::{ParticipantKind, Personality};
    use std::time::Duration;
    use tokio::sync::mpsc;

    // -----------------------------------------------------------------------
    // Deterministische Stubs
    // -----------------------------------------------------------------------

    struct StubTranskription(&'static str);

    #[async_trait]
    impl Transkription for StubTranskription {
        async fn transkribieren(
            &self,
            _audio: &[u8],
            _sprache: Option<&str>,
        ) -> Result<String, AiError> {
            Ok(self.0.to_string())
        }
    }

    /// Transkription mit spuerbarer Latenz (3 s pro Auftrag)
    struct LangsameTranskription(&'static str);

    #[async_trait]
    impl Transkription for LangsameTranskription {
        async fn transkribieren(
            &self,
            _audio: &[u8],
            _sprache: Option<&str>,
        ) -> Result<String, AiError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(self.0.to_string())
        }
    }

    struct StubSynthese;

    #[async_trait]
    impl SprachSynthese for StubSynthese {
        async fn synthetisieren(&self, _text: &str) -> Result<Vec<u8>, AiError> {
            Ok(vec![0xAA, 0xBB])
        }
    }

    struct FehlerSynthese;

    #[async_trait]
    impl SprachSynthese for FehlerSynthese {
        async fn synthetisieren(&self, _text: &str) -> Result<Vec<u8>, AiError> {
            Err(AiError::Synthese("Dienst nicht erreichbar".into()))
        }
    }

    struct FesteAntwort;

    impl AntwortGenerator for FesteAntwort {
        fn antwort_generieren(&self, _quelle: &str, _stil: Option<Personality>) -> String {
            "Interesting point.".to_string()
        }
    }

    /// Index 0, feste Wahrscheinlichkeit, Verzoegerung = Minimum
    struct StubZufall {
        wahrscheinlichkeit: f64,
    }

    impl ZufallsQuelle for StubZufall {
        fn index(&self, _len: usize) -> usize {
            0
        }
        fn wahrscheinlichkeit(&self) -> f64 {
            self.wahrscheinlichkeit
        }
        fn dauer_zwischen(&self, min: Duration, _max: Duration) -> Duration {
            min
        }
    }

    // -----------------------------------------------------------------------
    // Aufbau-Helfer
    // -----------------------------------------------------------------------

    fn test_state(
        transkript: &'static str,
        synthese: Arc<dyn SprachSynthese>,
        wahrscheinlichkeit: f64,
    ) -> Arc<EngineState> {
        EngineState::neu(
            crate::state::EngineConfig::default(),
            Arc::new(StubTranskription(transkript)),
            synthese,
            Arc::new(FesteAntwort),
            Arc::new(StubZufall { wahrscheinlichkeit }),
        )
    }

    /// Registriert eine Verbindung und laesst sie beitreten
    async fn beitreten(
        dispatcher: &EventDispatcher,
        state: &Arc<EngineState>,
        raum: &str,
        name: &str,
        config_label: &str,
    ) -> (ConnectionId, ParticipantId, mpsc::Receiver<ServerEvent>) {
        let verbindung = ConnectionId::neu();
        let rx = state.broadcaster.verbindung_registrieren(verbindung);
        dispatcher
            .dispatch(
                ClientEvent::Join {
                    room_id: RoomId::neu(raum),
                    participant: ParticipantDescriptor {
                        name: name.to_string(),
                        avatar: None,
                        topic: None,
                    },
                    config_label: Some(config_label.to_string()),
                },
                verbindung,
            )
            .await;

        let snapshot = state.raeume.raum(&RoomId::neu(raum)).unwrap();
        let id = snapshot
            .participants
            .iter()
            .find(|p| p.kind == ParticipantKind::Human && p.name == name)
            .unwrap()
            .id
            .clone();
        (verbindung, id, rx)
    }

    fn alle_ereignisse(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut ereignisse = Vec::new();
        while let Ok(e) = rx.try_recv() {
            ereignisse.push(e);
        }
        ereignisse
    }

    async fn zeit_vor(dauer: Duration) {
        tokio::time::advance(dauer).await;
        // Gefeuerte Timer-Tasks zu Ende laufen lassen
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn base64_chunk(daten: &[u8]) -> String {
        BASE64.encode(daten)
    }

    // -----------------------------------------------------------------------
    // Beitritt und Verlassen
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn beitritt_verteilt_snapshot_und_joined() {
        let state = test_state("", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));

        let (_v1, _p1, mut rx1) = beitreten(&dispatcher, &state, "r1", "Anna", "1ai3real").await;
        let (_v2, _p2, mut rx2) = beitreten(&dispatcher, &state, "r1", "Ben", "1ai3real").await;

        let bei_anna = alle_ereignisse(&mut rx1);
        // Anna: eigener Snapshot, dann Bens Joined + neuer Snapshot
        assert!(matches!(bei_anna[0], ServerEvent::RoomSnapshot { .. }));
        assert!(bei_anna
            .iter()
            .any(|e| matches!(e, ServerEvent::ParticipantJoined { .. })));

        let bei_ben = alle_ereignisse(&mut rx2);
        // Ben bekommt kein Joined ueber sich selbst, nur den Snapshot
        assert!(!bei_ben
            .iter()
            .any(|e| matches!(e, ServerEvent::ParticipantJoined { .. })));
        match bei_ben.last().unwrap() {
            ServerEvent::RoomSnapshot { room } => {
                // 1 KI + 2 Menschen
                assert_eq!(room.participants.len(), 3);
            }
            other => panic!("Erwartet RoomSnapshot, erhalten: {other:?}"),
        }
    }

    #[tokio::test]
    async fn letzter_mensch_verlaesst_leeren_raum() {
        let state = test_state("", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, _rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;

        dispatcher
            .dispatch(
                ClientEvent::Leave {
                    room_id: raum.clone(),
                    participant_id: teilnehmer,
                },
                verbindung,
            )
            .await;

        assert!(!state.raeume.existiert(&raum));
        assert_eq!(state.scheduler.anzahl(), 0);
    }

    #[tokio::test]
    async fn disconnect_wirkt_wie_leave() {
        let state = test_state("", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (v1, _p1, _rx1) = beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;
        let (_v2, _p2, mut rx2) = beitreten(&dispatcher, &state, "r1", "Ben", "4real").await;
        alle_ereignisse(&mut rx2);

        dispatcher.verbindung_getrennt(v1);

        assert!(state.raeume.existiert(&raum));
        assert_eq!(state.raeume.raum(&raum).unwrap().participants.len(), 1);
        let ereignisse = alle_ereignisse(&mut rx2);
        assert!(ereignisse
            .iter()
            .any(|e| matches!(e, ServerEvent::ParticipantLeft { .. })));
    }

    // -----------------------------------------------------------------------
    // Stille-Erkennung
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn stille_ablauf_transkript_hinweis_und_ki_antwort() {
        let state = test_state("Hello everyone", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "2ai2real").await;

        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: true,
                    audio_level: 0.7,
                },
                verbindung,
            )
            .await;
        dispatcher
            .dispatch(
                ClientEvent::AudioChunk {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    audio: base64_chunk(&[1, 2, 3, 4]),
                    timestamp: None,
                },
                verbindung,
            )
            .await;
        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: false,
                    audio_level: 0.0,
                },
                verbindung,
            )
            .await;
        alle_ereignisse(&mut rx);

        // 5 s Stille: Transkription des gepufferten Audios
        zeit_vor(Duration::from_secs(5)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        assert!(ereignisse.iter().any(|e| matches!(
            e,
            ServerEvent::TranscriptBroadcast {
                text,
                trigger: TriggerReason::Silence,
                ..
            } if text == "Hello everyone"
        )));

        // 1 s Gnadenfrist ohne neuen Sprecher: Hinweis an den Raum
        zeit_vor(Duration::from_secs(1)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        assert!(ereignisse
            .iter()
            .any(|e| matches!(e, ServerEvent::SystemNotice { .. })));

        // Nach der Mindest-Verzoegerung: KI-Antworten mit Audio
        zeit_vor(Duration::from_secs(3)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        let antworten: Vec<_> = ereignisse
            .iter()
            .filter_map(|e| match e {
                ServerEvent::AiReply { from, audio, trigger, .. } => {
                    Some((from.clone(), audio.clone(), *trigger))
                }
                _ => None,
            })
            .collect();
        assert!(!antworten.is_empty());
        for (from, audio, trigger) in &antworten {
            assert!(from.as_str().starts_with("ai-r1-"));
            assert_eq!(audio.as_deref(), Some(BASE64.encode([0xAA, 0xBB]).as_str()));
            assert_eq!(*trigger, TriggerReason::Silence);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn neuer_sprecher_bricht_stille_timer_ab() {
        let state = test_state("Hello", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "2ai2real").await;

        for speaking in [true, false] {
            dispatcher
                .dispatch(
                    ClientEvent::SpeakingStatus {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        speaking,
                        audio_level: 0.0,
                    },
                    verbindung,
                )
                .await;
        }
        assert!(state.scheduler.aktiv(&TimerKey::Stille(raum.clone())));

        // Kurz vor Ablauf beginnt Anna erneut zu sprechen
        zeit_vor(Duration::from_secs(4)).await;
        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: true,
                    audio_level: 0.5,
                },
                verbindung,
            )
            .await;
        assert!(!state.scheduler.aktiv(&TimerKey::Stille(raum.clone())));

        zeit_vor(Duration::from_secs(10)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        assert!(!ereignisse
            .iter()
            .any(|e| matches!(e, ServerEvent::SystemNotice { .. })));
    }

    // -----------------------------------------------------------------------
    // Dauersprecher
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn dauersprecher_feuert_genau_zweimal_in_25_sekunden() {
        let state = test_state("still talking", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "1ai1real").await;

        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: true,
                    audio_level: 0.9,
                },
                verbindung,
            )
            .await;

        let mut zwischenstaende = 0usize;
        let mut verstrichen = Duration::ZERO;
        while verstrichen < Duration::from_secs(25) {
            dispatcher
                .dispatch(
                    ClientEvent::AudioChunk {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        audio: base64_chunk(&[7; 16]),
                        timestamp: None,
                    },
                    verbindung,
                )
                .await;
            zeit_vor(Duration::from_secs(5)).await;
            verstrichen += Duration::from_secs(5);
            zwischenstaende += alle_ereignisse(&mut rx)
                .iter()
                .filter(|e| {
                    matches!(
                        e,
                        ServerEvent::TranscriptBroadcast {
                            trigger: TriggerReason::ContinuousSpeech,
                            ..
                        }
                    )
                })
                .count();
        }

        // Bei 10 s Intervall: Feuern bei t=10 und t=20, nicht bei t=25
        assert_eq!(zwischenstaende, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pegel_updates_starten_das_intervall_nicht_neu() {
        let state = test_state("immer noch dabei", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "1ai1real").await;

        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: true,
                    audio_level: 0.9,
                },
                verbindung,
            )
            .await;

        // Alle 5 s kommt ein Pegel-Update mit speaking=true; das darf die
        // 10-s-Uhr nicht zuruecksetzen, sonst feuert sie nie
        let mut zwischenstaende = 0usize;
        let mut verstrichen = Duration::ZERO;
        let mut pegel = 0.5f32;
        while verstrichen < Duration::from_secs(25) {
            dispatcher
                .dispatch(
                    ClientEvent::AudioChunk {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        audio: base64_chunk(&[9; 16]),
                        timestamp: None,
                    },
                    verbindung,
                )
                .await;
            dispatcher
                .dispatch(
                    ClientEvent::SpeakingStatus {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        speaking: true,
                        audio_level: pegel,
                    },
                    verbindung,
                )
                .await;
            pegel += 0.05;
            zeit_vor(Duration::from_secs(5)).await;
            verstrichen += Duration::from_secs(5);
            zwischenstaende += alle_ereignisse(&mut rx)
                .iter()
                .filter(|e| {
                    matches!(
                        e,
                        ServerEvent::TranscriptBroadcast {
                            trigger: TriggerReason::ContinuousSpeech,
                            ..
                        }
                    )
                })
                .count();
        }

        assert_eq!(
            zwischenstaende, 2,
            "25 s Dauersprechen mit Pegel-Updates muss genau zweimal feuern"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transkriptionsdauer_verschiebt_die_kadenz_nicht() {
        let state = EngineState::neu(
            crate::state::EngineConfig::default(),
            Arc::new(LangsameTranskription("langer Monolog")),
            Arc::new(StubSynthese),
            Arc::new(FesteAntwort),
            Arc::new(StubZufall {
                wahrscheinlichkeit: 1.0,
            }),
        );
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "1ai1real").await;

        dispatcher
            .dispatch(
                ClientEvent::SpeakingStatus {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    speaking: true,
                    audio_level: 0.9,
                },
                verbindung,
            )
            .await;

        // Intervall 10 s, Transkription 3 s: das naechste Intervall beginnt
        // beim Feuern, nicht erst nach der Verarbeitung. Zwischenstaende
        // erscheinen bei t=13 und t=23 statt bei t=13 und t=26.
        let mut zwischenstaende = 0usize;
        let mut verstrichen = Duration::ZERO;
        while verstrichen < Duration::from_secs(25) {
            dispatcher
                .dispatch(
                    ClientEvent::AudioChunk {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        audio: base64_chunk(&[3; 16]),
                        timestamp: None,
                    },
                    verbindung,
                )
                .await;
            zeit_vor(Duration::from_secs(5)).await;
            verstrichen += Duration::from_secs(5);
            zwischenstaende += alle_ereignisse(&mut rx)
                .iter()
                .filter(|e| {
                    matches!(
                        e,
                        ServerEvent::TranscriptBroadcast {
                            trigger: TriggerReason::ContinuousSpeech,
                            ..
                        }
                    )
                })
                .count();
        }

        assert_eq!(zwischenstaende, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sprechende_beendet_dauersprecher_intervall() {
        let state = test_state("text", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;

        for speaking in [true, false] {
            dispatcher
                .dispatch(
                    ClientEvent::SpeakingStatus {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        speaking,
                        audio_level: 0.0,
                    },
                    verbindung,
                )
                .await;
        }
        assert!(!state
            .scheduler
            .aktiv(&TimerKey::Dauersprecher(raum.clone(), teilnehmer.clone())));

        zeit_vor(Duration::from_secs(30)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        assert!(!ereignisse.iter().any(|e| matches!(
            e,
            ServerEvent::TranscriptBroadcast {
                trigger: TriggerReason::ContinuousSpeech,
                ..
            }
        )));
    }

    // -----------------------------------------------------------------------
    // Timer gegen geloeschten Zustand
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn verlassen_macht_schlafende_timer_wirkungslos() {
        let state = test_state("text", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;

        // Stille-Timer scharf, dann Raum verlassen (Raum wird geloescht)
        for speaking in [true, false] {
            dispatcher
                .dispatch(
                    ClientEvent::SpeakingStatus {
                        room_id: raum.clone(),
                        participant_id: teilnehmer.clone(),
                        speaking,
                        audio_level: 0.0,
                    },
                    verbindung,
                )
                .await;
        }
        dispatcher
            .dispatch(
                ClientEvent::Leave {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                },
                verbindung,
            )
            .await;
        assert!(!state.raeume.existiert(&raum));
        alle_ereignisse(&mut rx);

        // Kein Timer darf mehr feuern, nichts darf crashen
        zeit_vor(Duration::from_secs(30)).await;
        assert!(alle_ereignisse(&mut rx).is_empty());
        assert_eq!(state.scheduler.anzahl(), 0);
    }

    // -----------------------------------------------------------------------
    // Synthese-Ausfall
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn synthese_ausfall_degradiert_zu_text_antwort() {
        let state = test_state("Hello", Arc::new(FehlerSynthese), 0.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "2ai2real").await;

        // Wuerfel liefert 0.0, unter der Schwelle: KI antwortet sicher
        dispatcher
            .dispatch(
                ClientEvent::TranscriptionText {
                    room_id: raum.clone(),
                    participant_id: teilnehmer.clone(),
                    text: "What do you think?".to_string(),
                },
                verbindung,
            )
            .await;

        zeit_vor(Duration::from_secs(5)).await;
        let ereignisse = alle_ereignisse(&mut rx);
        let antwort = ereignisse
            .iter()
            .find_map(|e| match e {
                ServerEvent::AiReply { message, audio, .. } => Some((message.clone(), audio.clone())),
                _ => None,
            })
            .expect("KI-Antwort erwartet");
        assert_eq!(antwort.0, "Interesting point.");
        assert!(antwort.1.is_none(), "Audio muss bei Synthese-Ausfall fehlen");
    }

    // -----------------------------------------------------------------------
    // Client-Transkripte
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn client_transkript_geht_an_andere_nicht_an_sender() {
        let state = test_state("", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (v1, p1, mut rx1) = beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;
        let (_v2, _p2, mut rx2) = beitreten(&dispatcher, &state, "r1", "Ben", "4real").await;
        alle_ereignisse(&mut rx1);
        alle_ereignisse(&mut rx2);

        dispatcher
            .dispatch(
                ClientEvent::TranscriptionText {
                    room_id: raum.clone(),
                    participant_id: p1,
                    text: "My two cents".to_string(),
                },
                v1,
            )
            .await;

        assert!(!alle_ereignisse(&mut rx1)
            .iter()
            .any(|e| matches!(e, ServerEvent::TranscriptBroadcast { .. })));
        assert!(alle_ereignisse(&mut rx2).iter().any(|e| matches!(
            e,
            ServerEvent::TranscriptBroadcast {
                trigger: TriggerReason::UserInitiated,
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn sekundaer_trigger_unterliegt_wahrscheinlichkeit() {
        // Wuerfel liefert 0.9, Schwelle ist 0.3: keine KI-Antwort
        let state = test_state("", Arc::new(StubSynthese), 0.9);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (verbindung, teilnehmer, mut rx) =
            beitreten(&dispatcher, &state, "r1", "Anna", "2ai2real").await;
        alle_ereignisse(&mut rx);

        dispatcher
            .dispatch(
                ClientEvent::TranscriptionText {
                    room_id: raum,
                    participant_id: teilnehmer,
                    text: "No takers?".to_string(),
                },
                verbindung,
            )
            .await;

        zeit_vor(Duration::from_secs(10)).await;
        assert!(!alle_ereignisse(&mut rx)
            .iter()
            .any(|e| matches!(e, ServerEvent::AiReply { .. })));
    }

    // -----------------------------------------------------------------------
    // Signal-Relay
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn signal_relay_wird_opaque_durchgereicht() {
        let state = test_state("", Arc::new(StubSynthese), 1.0);
        let dispatcher = EventDispatcher::neu(Arc::clone(&state));
        let raum = RoomId::neu("r1");

        let (v1, p1, mut rx1) = beitreten(&dispatcher, &state, "r1", "Anna", "4real").await;
        let (_v2, _p2, mut rx2) = beitreten(&dispatcher, &state, "r1", "Ben", "4real").await;
        alle_ereignisse(&mut rx1);
        alle_ereignisse(&mut rx2);

        dispatcher
            .dispatch(
                ClientEvent::SignalRelay {
                    room_id: raum,
                    signal_type: "offer".to_string(),
                    payload: serde_json::json!({ "sdp": "v=0..." }),
                    from_id: p1,
                    target_id: None,
                },
                v1,
            )
            .await;

        assert!(alle_ereignisse(&mut rx1).is_empty(), "Sender bekommt kein Echo");
        match alle_ereignisse(&mut rx2).first() {
            Some(ServerEvent::SignalRelay { signal_type, payload, .. }) => {
                assert_eq!(signal_type, "offer");
                assert_eq!(payload["sdp"], "v=0...");
            }
            other => panic!("Erwartet SignalRelay, erhalten: {other:?}"),
        }
    }
}
