//! Ereignis-Protokoll zwischen Client und Server
//!
//! ## Design
//! - Fire-and-forget: Ereignisse haben keine Request-IDs, der Server
//!   antwortet ausschliesslich mit Broadcast-Ereignissen an den Raum
//! - Tagged Enums (`event` + `data`) fuer typsichere Nachrichtentypen
//! - Audio-Daten werden auf dem Draht base64-kodiert transportiert
//! - Signaling-Payloads (WebRTC) sind fuer den Server opaque JSON-Werte

use chrono::{DateTime, Utc};
use podium_core::types::{ParticipantId, ParticipantKind, Personality, RoomId, TriggerReason};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Teilnehmer- und Raum-Ansichten
// ---------------------------------------------------------------------------

/// Teilnehmer-Beschreibung wie sie der Client beim Join mitschickt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDescriptor {
    /// Anzeigename
    pub name: String,
    /// Avatar (Emoji oder URL), Standard: "👤"
    #[serde(default)]
    pub avatar: Option<String>,
    /// Diskussionsthema (nur beim ersten Join eines Raums relevant)
    #[serde(default)]
    pub topic: Option<String>,
}

/// Oeffentliche Sicht auf einen Teilnehmer (ohne Verbindungs-Details)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub name: String,
    pub avatar: String,
    pub kind: ParticipantKind,
    /// Nur fuer KI-Teilnehmer gesetzt
    #[serde(default)]
    pub personality: Option<Personality>,
    pub muted: bool,
    pub speaking: bool,
    /// Zuletzt gemeldeter normalisierter Pegel (0..1)
    pub audio_level: f32,
}

/// Vollstaendiger Raum-Schnappschuss fuer Broadcasts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub topic: String,
    pub config_label: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    /// Teilnehmer in Beitrittsreihenfolge (KI-Teilnehmer zuerst)
    pub participants: Vec<ParticipantInfo>,
}

// ---------------------------------------------------------------------------
// Eingehende Ereignisse (Client -> Server)
// ---------------------------------------------------------------------------

/// Alle Ereignisse die ein Client senden kann
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Raum betreten (erstellt den Raum falls noetig)
    Join {
        room_id: RoomId,
        participant: ParticipantDescriptor,
        /// Label der Teilnehmer-Mischung, z.B. "2ai2real"
        #[serde(default)]
        config_label: Option<String>,
    },
    /// Raum explizit verlassen
    Leave {
        room_id: RoomId,
        participant_id: ParticipantId,
    },
    /// Mute-Status aendern (client-deklariert)
    MuteToggle {
        room_id: RoomId,
        participant_id: ParticipantId,
        muted: bool,
    },
    /// Sprech-Status melden (Server erzwingt Single-Speaker)
    SpeakingStatus {
        room_id: RoomId,
        participant_id: ParticipantId,
        speaking: bool,
        #[serde(default)]
        audio_level: f32,
    },
    /// Rohes Audio-Fragment (base64-kodiert)
    AudioChunk {
        room_id: RoomId,
        participant_id: ParticipantId,
        audio: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    /// Clientseitig erzeugte Transkription
    TranscriptionText {
        room_id: RoomId,
        participant_id: ParticipantId,
        text: String,
    },
    /// Opaque Signaling-Relay (WebRTC o.ae.), wird nicht interpretiert
    SignalRelay {
        room_id: RoomId,
        signal_type: String,
        payload: serde_json::Value,
        from_id: ParticipantId,
        #[serde(default)]
        target_id: Option<ParticipantId>,
    },
}

// ---------------------------------------------------------------------------
// Ausgehende Ereignisse (Server -> Client)
// ---------------------------------------------------------------------------

/// Alle Ereignisse die der Server an Clients sendet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Vollstaendiger Raumzustand (nach Join/Leave-Aenderungen)
    RoomSnapshot { room: RoomSnapshot },
    /// Ein Teilnehmer ist beigetreten
    ParticipantJoined { participant: ParticipantInfo },
    /// Ein Teilnehmer hat den Raum verlassen
    ParticipantLeft { participant_id: ParticipantId },
    /// Mute-Status eines Teilnehmers hat sich geaendert
    MuteUpdated {
        participant_id: ParticipantId,
        muted: bool,
    },
    /// Sprech-Status eines Teilnehmers hat sich geaendert
    SpeakingUpdated {
        participant_id: ParticipantId,
        speaking: bool,
        audio_level: f32,
    },
    /// Transkript eines Teilnehmers
    TranscriptBroadcast {
        participant_id: ParticipantId,
        text: String,
        trigger: TriggerReason,
    },
    /// KI-Antwort (Audio optional – Synthese-Ausfall degradiert zu Text)
    AiReply {
        from: ParticipantId,
        message: String,
        /// base64-kodiertes Audio, `null` wenn die Synthese fehlschlug
        audio: Option<String>,
        trigger: TriggerReason,
        timestamp: DateTime<Utc>,
    },
    /// Systemhinweis an alle Teilnehmer
    SystemNotice { message: String },
    /// Durchgereichtes Signaling-Ereignis
    SignalRelay {
        signal_type: String,
        payload: serde_json::Value,
        from_id: ParticipantId,
        #[serde(default)]
        target_id: Option<ParticipantId>,
    },
}
