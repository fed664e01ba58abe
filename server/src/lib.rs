//! podium-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Collaborator-Dienste und Engine zu einem
//! lauffaehigen Server; oeffentlicher Einstiegspunkt fuer
//! Integrationstests.

pub mod config;

use anyhow::Result;
use config::PodiumConfig;
use podium_ai::{
    antwort::VorlagenAntworten, AntwortGenerator, EchteZufallsQuelle, ElevenLabsSynthese,
    SprachSynthese, Transkription, WhisperHttpTranskription, ZufallsQuelle,
};
use podium_engine::{EngineServer, EngineState};
use std::sync::Arc;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: PodiumConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: PodiumConfig) -> Self {
        Self { config }
    }

    /// Startet die Engine und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Collaborator-Dienste aufbauen (Transkription, Synthese, Antworten)
    /// 2. Engine-Zustand erstellen
    /// 3. TCP-Listener starten
    /// 4. Auf Ctrl-C warten, dann Shutdown signalisieren
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        let zufall: Arc<dyn ZufallsQuelle> = Arc::new(EchteZufallsQuelle);

        // Fehlende Schluessel sind kein Startfehler: die betroffenen
        // Dienste schlagen zur Laufzeit fehl und die Engine degradiert
        let openai_key = self.config.openai_api_key().unwrap_or_else(|| {
            tracing::warn!("Kein OpenAI-API-Schluessel – Transkription wird fehlschlagen");
            String::new()
        });
        let elevenlabs_key = self.config.elevenlabs_api_key().unwrap_or_else(|| {
            tracing::warn!("Kein ElevenLabs-API-Schluessel – Antworten kommen ohne Audio");
            String::new()
        });

        let transkription: Arc<dyn Transkription> =
            Arc::new(WhisperHttpTranskription::neu(openai_key));
        let mut synthese_dienst = ElevenLabsSynthese::neu(elevenlabs_key);
        if let Some(voice_id) = &self.config.ki.voice_id {
            synthese_dienst = synthese_dienst.mit_stimme(voice_id.clone());
        }
        let synthese: Arc<dyn SprachSynthese> = Arc::new(synthese_dienst);
        let antworten: Arc<dyn AntwortGenerator> =
            Arc::new(VorlagenAntworten::neu(Arc::clone(&zufall)));

        let state = EngineState::neu(
            self.config.engine_config(),
            transkription,
            synthese,
            antworten,
            zufall,
        );

        let bind_addr = self.config.tcp_bind_adresse().parse()?;
        let engine = EngineServer::neu(state, bind_addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let engine_handle = tokio::spawn(engine.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        engine_handle.await??;

        Ok(())
    }
}
