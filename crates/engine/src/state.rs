//! Engine-Zustand – buendelt alle geteilten Komponenten
//!
//! `EngineState` wird einmal beim Serverstart erstellt und als `Arc` an
//! alle Verbindungs-Tasks und Timer-Aufgaben gereicht. Die Collaborator-
//! Dienste stehen hinter Traits, damit Tests sie durch deterministische
//! Stubs ersetzen koennen.

use podium_ai::{AntwortGenerator, SprachSynthese, Transkription, ZufallsQuelle};
use podium_audio::{ActivityScheduler, AudioBufferManager};
use podium_core::types::RoomId;
use podium_rooms::{EventBroadcaster, RoomRegistry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Zeitkonstanten und Schwellwerte der Engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stille-Timer: Dauer ohne aktiven Sprecher bis zur Verarbeitung
    pub stille_timeout: Duration,
    /// Gnadenfrist nach der Stille-Verarbeitung bevor die KI einspringt
    pub stille_gnadenfrist: Duration,
    /// Dauersprecher-Timer: Intervall der Zwischen-Transkription
    pub dauersprecher_intervall: Duration,
    /// Untere Grenze der KI-Antwort-Verzoegerung
    pub antwort_verzoegerung_min: Duration,
    /// Obere Grenze der KI-Antwort-Verzoegerung
    pub antwort_verzoegerung_max: Duration,
    /// Wahrscheinlichkeit einer KI-Antwort auf Client-Transkripte
    pub sekundaer_antwort_wahrscheinlichkeit: f64,
    /// Maximales Alter gepufferter Audio-Fragmente
    pub max_puffer_alter: Duration,
    /// Sprach-Hinweis fuer die Transkription (ISO-639-1), `None` = automatisch
    pub sprache: Option<String>,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stille_timeout: Duration::from_secs(5),
            stille_gnadenfrist: Duration::from_secs(1),
            dauersprecher_intervall: Duration::from_secs(10),
            antwort_verzoegerung_min: Duration::from_secs(2),
            antwort_verzoegerung_max: Duration::from_secs(5),
            sekundaer_antwort_wahrscheinlichkeit: 0.3,
            max_puffer_alter: Duration::from_secs(30),
            sprache: None,
            max_verbindungen: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Geteilter Zustand der Engine
pub struct EngineState {
    pub config: EngineConfig,
    pub raeume: RoomRegistry,
    pub puffer: AudioBufferManager,
    pub scheduler: ActivityScheduler,
    pub broadcaster: EventBroadcaster,
    pub transkription: Arc<dyn Transkription>,
    pub synthese: Arc<dyn SprachSynthese>,
    pub antworten: Arc<dyn AntwortGenerator>,
    pub zufall: Arc<dyn ZufallsQuelle>,
    /// Laufende Sequenznummer der Antwort-Timer
    antwort_seq: AtomicU64,
}

impl EngineState {
    /// Erstellt den Engine-Zustand mit den gegebenen Collaborator-Diensten
    pub fn neu(
        config: EngineConfig,
        transkription: Arc<dyn Transkription>,
        synthese: Arc<dyn SprachSynthese>,
        antworten: Arc<dyn AntwortGenerator>,
        zufall: Arc<dyn ZufallsQuelle>,
    ) -> Arc<Self> {
        let puffer = AudioBufferManager::mit_max_alter(config.max_puffer_alter);
        Arc::new(Self {
            config,
            raeume: RoomRegistry::neu(),
            puffer,
            scheduler: ActivityScheduler::neu(),
            broadcaster: EventBroadcaster::neu(),
            transkription,
            synthese,
            antworten,
            zufall,
            antwort_seq: AtomicU64::new(0),
        })
    }

    /// Naechste eindeutige Sequenznummer fuer Antwort-Timer
    pub fn naechste_antwort_seq(&self) -> u64 {
        self.antwort_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Raeumt alle Timer und Puffer eines geloeschten Raums ab
    pub fn raum_aufraeumen(&self, raum: &RoomId) {
        self.scheduler.raum_abbrechen(raum);
        self.puffer.raum_entfernen(raum);
        tracing::debug!(raum = %raum, "Raum-Ressourcen aufgeraeumt");
    }
}
