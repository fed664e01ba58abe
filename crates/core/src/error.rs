//! Fehlertypen fuer Podium
//!
//! Zentraler Fehler-Enum. Wichtig: Nicht-gefunden-Faelle (abgelaufene
//! Raum- oder Teilnehmer-IDs) werden im Orchestrierungs-Kern NICHT als
//! Fehler propagiert sondern als geloggte No-Ops behandelt – dieser Enum
//! deckt die Faelle ab in denen ein Aufrufer tatsaechlich reagieren muss.

use thiserror::Error;

/// Globaler Result-Alias fuer Podium
pub type Result<T> = std::result::Result<T, PodiumError>;

/// Alle moeglichen Fehler im Podium-System
#[derive(Debug, Error)]
pub enum PodiumError {
    // --- Ressourcen ---
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(String),

    #[error("Teilnehmer nicht gefunden: {0}")]
    TeilnehmerNichtGefunden(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Collaborator-Dienste ---
    #[error("Transkription fehlgeschlagen: {0}")]
    Transkription(String),

    #[error("Sprachsynthese fehlgeschlagen: {0}")]
    Synthese(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PodiumError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler einen Collaborator-Dienst betrifft
    ///
    /// Collaborator-Fehler degradieren zu "kein Ergebnis fuer diesen
    /// Zyklus" und duerfen niemals einen Raum beenden.
    pub fn ist_collaborator_fehler(&self) -> bool {
        matches!(self, Self::Transkription(_) | Self::Synthese(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = PodiumError::RaumNichtGefunden("raum-1".into());
        assert_eq!(e.to_string(), "Raum nicht gefunden: raum-1");
    }

    #[test]
    fn collaborator_fehler_erkennung() {
        assert!(PodiumError::Transkription("timeout".into()).ist_collaborator_fehler());
        assert!(PodiumError::Synthese("503".into()).ist_collaborator_fehler());
        assert!(!PodiumError::Intern("x".into()).ist_collaborator_fehler());
    }
}
