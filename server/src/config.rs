//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. API-Schluessel koennen alternativ ueber
//! Umgebungsvariablen kommen (`OPENAI_API_KEY`, `ELEVENLABS_API_KEY`).

use podium_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PodiumConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Aktivitaets-Erkennung und Audio-Pufferung
    pub audio: AudioEinstellungen,
    /// KI-Collaborator-Einstellungen
    pub ki: KiEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Podium Server".into(),
            max_verbindungen: 256,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer die TCP-Verbindung
    pub bind_adresse: String,
    /// Port fuer die TCP-Verbindung
    pub tcp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 5000,
        }
    }
}

/// Aktivitaets-Erkennung und Audio-Pufferung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Stille-Timer in Millisekunden
    pub stille_timeout_ms: u64,
    /// Gnadenfrist nach der Stille-Verarbeitung in Millisekunden
    pub stille_gnadenfrist_ms: u64,
    /// Dauersprecher-Intervall in Millisekunden
    pub dauersprecher_intervall_ms: u64,
    /// Maximales Alter gepufferter Audio-Fragmente in Millisekunden
    pub max_puffer_alter_ms: u64,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            stille_timeout_ms: 5_000,
            stille_gnadenfrist_ms: 1_000,
            dauersprecher_intervall_ms: 10_000,
            max_puffer_alter_ms: 30_000,
        }
    }
}

/// KI-Collaborator-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KiEinstellungen {
    /// API-Schluessel fuer die Transkription (sonst `OPENAI_API_KEY`)
    pub openai_api_key: Option<String>,
    /// API-Schluessel fuer die Synthese (sonst `ELEVENLABS_API_KEY`)
    pub elevenlabs_api_key: Option<String>,
    /// Stimme der Sprachsynthese
    pub voice_id: Option<String>,
    /// Sprach-Hinweis fuer die Transkription (ISO-639-1)
    pub sprache: Option<String>,
    /// Untere Grenze der Antwort-Verzoegerung in Millisekunden
    pub antwort_verzoegerung_min_ms: u64,
    /// Obere Grenze der Antwort-Verzoegerung in Millisekunden
    pub antwort_verzoegerung_max_ms: u64,
    /// Wahrscheinlichkeit einer KI-Antwort auf Client-Transkripte (0..1)
    pub sekundaer_antwort_wahrscheinlichkeit: f64,
}

impl Default for KiEinstellungen {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            elevenlabs_api_key: None,
            voice_id: None,
            sprache: None,
            antwort_verzoegerung_min_ms: 2_000,
            antwort_verzoegerung_max_ms: 5_000,
            sekundaer_antwort_wahrscheinlichkeit: 0.3,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl PodiumConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// API-Schluessel fuer die Transkription (Datei vor Umgebung)
    pub fn openai_api_key(&self) -> Option<String> {
        self.ki
            .openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// API-Schluessel fuer die Synthese (Datei vor Umgebung)
    pub fn elevenlabs_api_key(&self) -> Option<String> {
        self.ki
            .elevenlabs_api_key
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
    }

    /// Uebersetzt die Datei-Konfiguration in die Engine-Konfiguration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            stille_timeout: Duration::from_millis(self.audio.stille_timeout_ms),
            stille_gnadenfrist: Duration::from_millis(self.audio.stille_gnadenfrist_ms),
            dauersprecher_intervall: Duration::from_millis(self.audio.dauersprecher_intervall_ms),
            antwort_verzoegerung_min: Duration::from_millis(self.ki.antwort_verzoegerung_min_ms),
            antwort_verzoegerung_max: Duration::from_millis(self.ki.antwort_verzoegerung_max_ms),
            sekundaer_antwort_wahrscheinlichkeit: self.ki.sekundaer_antwort_wahrscheinlichkeit,
            max_puffer_alter: Duration::from_millis(self.audio.max_puffer_alter_ms),
            sprache: self.ki.sprache.clone(),
            max_verbindungen: self.server.max_verbindungen,
        }
    }
}
