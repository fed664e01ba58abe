//! Sprachsynthese – Text zu Audio
//!
//! Produktions-Implementierung gegen eine ElevenLabs-kompatible HTTP-API
//! (`POST /v1/text-to-speech/{voice_id}`, rohe Audio-Bytes als Antwort).

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AiError;

/// Standard-Basis-URL der Synthese-API
pub const STANDARD_BASIS_URL: &str = "https://api.elevenlabs.io";

/// Standard-Stimme
pub const STANDARD_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Wandelt Text in rohe Audio-Bytes um
#[async_trait]
pub trait SprachSynthese: Send + Sync {
    async fn synthetisieren(&self, text: &str) -> Result<Vec<u8>, AiError>;
}

// ---------------------------------------------------------------------------
// ElevenLabsSynthese
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SyntheseAnfrage<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs-kompatible HTTP-Synthese
pub struct ElevenLabsSynthese {
    client: reqwest::Client,
    basis_url: String,
    voice_id: String,
    api_key: String,
}

impl ElevenLabsSynthese {
    pub fn neu(api_key: impl Into<String>) -> Self {
        Self::mit_basis_url(api_key, STANDARD_BASIS_URL)
    }

    pub fn mit_basis_url(api_key: impl Into<String>, basis_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            basis_url: basis_url.into(),
            voice_id: STANDARD_VOICE_ID.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn mit_stimme(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }
}

#[async_trait]
impl SprachSynthese for ElevenLabsSynthese {
    async fn synthetisieren(&self, text: &str) -> Result<Vec<u8>, AiError> {
        let url = format!("{}/v1/text-to-speech/{}", self.basis_url, self.voice_id);
        let anfrage = SyntheseAnfrage {
            text,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let antwort = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&anfrage)
            .send()
            .await?;

        if !antwort.status().is_success() {
            let status = antwort.status();
            let koerper = antwort.text().await.unwrap_or_default();
            return Err(AiError::Synthese(format!("Status {status}: {koerper}")));
        }

        let bytes = antwort.bytes().await?;
        tracing::debug!(laenge = bytes.len(), "Synthese-Audio erhalten");
        Ok(bytes.to_vec())
    }
}
