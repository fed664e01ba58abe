//! Transkription – Audio zu Text
//!
//! Produktions-Implementierung gegen eine Whisper-kompatible HTTP-API
//! (multipart `file` + `model`, JSON-Antwort mit `text`-Feld).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AiError;

/// Standard-Endpunkt der Transkriptions-API
pub const STANDARD_ENDPUNKT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Standard-Modell
pub const STANDARD_MODELL: &str = "whisper-1";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Wandelt rohe Audio-Bytes in Text um
#[async_trait]
pub trait Transkription: Send + Sync {
    /// Transkribiert die gegebenen Audio-Bytes
    ///
    /// Leere oder unverstaendliche Aufnahmen liefern einen leeren String,
    /// keinen Fehler.
    async fn transkribieren(&self, audio: &[u8], sprache: Option<&str>)
        -> Result<String, AiError>;
}

// ---------------------------------------------------------------------------
// WhisperHttpTranskription
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TranskriptionsAntwort {
    text: String,
}

/// Whisper-kompatible HTTP-Transkription
pub struct WhisperHttpTranskription {
    client: reqwest::Client,
    endpunkt: String,
    modell: String,
    api_key: String,
}

impl WhisperHttpTranskription {
    pub fn neu(api_key: impl Into<String>) -> Self {
        Self::mit_endpunkt(api_key, STANDARD_ENDPUNKT)
    }

    pub fn mit_endpunkt(api_key: impl Into<String>, endpunkt: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpunkt: endpunkt.into(),
            modell: STANDARD_MODELL.to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Transkription for WhisperHttpTranskription {
    async fn transkribieren(
        &self,
        audio: &[u8],
        sprache: Option<&str>,
    ) -> Result<String, AiError> {
        let datei = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.webm")
            .mime_str("audio/webm")
            .map_err(|e| AiError::Transkription(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", datei)
            .text("model", self.modell.clone());
        if let Some(sprache) = sprache {
            form = form.text("language", sprache.to_string());
        }

        let antwort = self
            .client
            .post(&self.endpunkt)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !antwort.status().is_success() {
            let status = antwort.status();
            let koerper = antwort.text().await.unwrap_or_default();
            return Err(AiError::Transkription(format!(
                "Status {status}: {koerper}"
            )));
        }

        let ergebnis: TranskriptionsAntwort = antwort.json().await?;
        tracing::debug!(laenge = ergebnis.text.len(), "Transkription erhalten");
        Ok(ergebnis.text)
    }
}
