//! Gemeinsame Identifikations- und Klassifikationstypen fuer Podium
//!
//! Raum-IDs kommen von aussen (opaque Strings aus der Session-Verwaltung),
//! Teilnehmer-IDs werden serverseitig vergeben: UUIDs fuer Menschen,
//! deterministische `ai-<raum>-<index>`-IDs fuer KI-Teilnehmer.
//! Das Newtype-Pattern schliesst Verwechslungen zur Compilezeit aus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Raum-ID (extern vergeben, opaque)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem beliebigen String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Eindeutige Teilnehmer-ID innerhalb eines Raums
///
/// Menschen erhalten eine zufaellige UUID, KI-Teilnehmer eine
/// deterministische ID der Form `ai-<raum>-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Erstellt eine neue zufaellige ID fuer einen menschlichen Teilnehmer
    pub fn neu_mensch() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Erstellt die deterministische ID eines KI-Teilnehmers
    pub fn neu_ki(raum: &RoomId, index: usize) -> Self {
        Self(format!("ai-{}-{}", raum, index))
    }

    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Eindeutige Verbindungs-ID (pro TCP-Verbindung vergeben)
///
/// KI-Teilnehmer haben keine Transportverbindung und damit keine
/// ConnectionId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn neu() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::neu()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Art eines Teilnehmers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    /// Menschlicher Teilnehmer mit Transportverbindung
    Human,
    /// KI-Teilnehmer (bei Raumerstellung erzeugt, keine Verbindung)
    Ai,
}

/// Antwort-Stil eines KI-Teilnehmers
///
/// Waehlt den Pool vorgefertigter Antworten aus. Unbekannte Werte
/// fallen bei der Pool-Auswahl auf `Analytical` zurueck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Analytical,
    Creative,
    Supportive,
    Technical,
    Facilitator,
}

/// Ausloeser eines Verarbeitungs- oder Antwort-Zyklus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerReason {
    /// Stille-Timer hat ausgeloest (niemand spricht seit dem Quiet-Intervall)
    Silence,
    /// Dauersprecher-Timer hat ausgeloest (Monolog-Segmentierung)
    ContinuousSpeech,
    /// Vom Client selbst angestossen (z.B. eigene Transkription)
    UserInitiated,
}
