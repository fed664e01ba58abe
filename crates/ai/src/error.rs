//! Fehlertypen der Collaborator-Dienste

use thiserror::Error;

/// Fehler der KI-Collaborator-Dienste
///
/// Collaborator-Ausfaelle sind erwartete Betriebszustaende: die Engine
/// loggt sie und degradiert (Transkription entfaellt, Antwort kommt ohne
/// Audio) statt die Sitzung zu beenden.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Transkription fehlgeschlagen: {0}")]
    Transkription(String),

    #[error("Sprachsynthese fehlgeschlagen: {0}")]
    Synthese(String),

    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),
}
