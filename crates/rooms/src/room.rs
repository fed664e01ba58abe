//! Raum- und Teilnehmer-Datenmodell
//!
//! Ein Raum haelt seine Teilnehmer in Beitrittsreihenfolge; KI-Teilnehmer
//! werden einmalig bei der Raumerstellung erzeugt und stehen daher immer
//! am Anfang der Liste. Invariante: hoechstens ein Teilnehmer pro Raum
//! hat `speaking = true`.

use chrono::{DateTime, Utc};
use podium_core::types::{ConnectionId, ParticipantId, ParticipantKind, Personality, RoomId};
use podium_protocol::events::{ParticipantInfo, RoomSnapshot};

// ---------------------------------------------------------------------------
// Teilnehmer-Mischung
// ---------------------------------------------------------------------------

/// Anzahl KI- und menschlicher Teilnehmer laut Konfigurations-Label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeilnehmerMix {
    pub ki_anzahl: usize,
    pub menschen_anzahl: usize,
}

/// Standard-Label wenn der Client keines angibt oder das Label unbekannt ist
pub const STANDARD_MIX_LABEL: &str = "2ai2real";

/// Loest ein Konfigurations-Label in die Teilnehmer-Mischung auf
///
/// Unbekannte Labels fallen auf die Standard-Mischung (2 KI, 2 Menschen)
/// zurueck. Die Menschen-Anzahl ist informativ – der Server erzwingt
/// kein Beitritts-Limit.
pub fn mix_fuer_label(label: &str) -> TeilnehmerMix {
    match label {
        "2ai2real" => TeilnehmerMix { ki_anzahl: 2, menschen_anzahl: 2 },
        "1ai3real" => TeilnehmerMix { ki_anzahl: 1, menschen_anzahl: 3 },
        "3ai1real" => TeilnehmerMix { ki_anzahl: 3, menschen_anzahl: 1 },
        "4real" => TeilnehmerMix { ki_anzahl: 0, menschen_anzahl: 4 },
        "1ai1real" => TeilnehmerMix { ki_anzahl: 1, menschen_anzahl: 1 },
        "2ai1real" => TeilnehmerMix { ki_anzahl: 2, menschen_anzahl: 1 },
        "1ai2real" => TeilnehmerMix { ki_anzahl: 1, menschen_anzahl: 2 },
        "4ai" => TeilnehmerMix { ki_anzahl: 4, menschen_anzahl: 0 },
        unbekannt => {
            tracing::debug!(label = unbekannt, "Unbekanntes Mix-Label, Standard-Mischung");
            TeilnehmerMix { ki_anzahl: 2, menschen_anzahl: 2 }
        }
    }
}

/// KI-Teilnehmer-Vorlagen (Name, Avatar, Antwort-Stil)
///
/// Bei mehr als fuenf KI-Teilnehmern wird die Liste zyklisch wiederholt.
const KI_VORLAGEN: [(&str, &str, Personality); 5] = [
    ("AI Assistant - Sarah", "🤖", Personality::Analytical),
    ("AI Bot - Alex", "🤖", Personality::Creative),
    ("AI Helper - Maya", "🤖", Personality::Supportive),
    ("AI Expert - Dr. Chen", "🤖", Personality::Technical),
    ("AI Moderator - James", "🤖", Personality::Facilitator),
];

/// Standard-Avatar fuer menschliche Teilnehmer
pub const STANDARD_AVATAR: &str = "👤";

/// Standard-Thema wenn der erste Teilnehmer keines angibt
pub const STANDARD_THEMA: &str = "Untitled Discussion";

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// Ein Teilnehmer eines Raums (Mensch oder KI)
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    /// Verbindungs-Handle; `None` fuer KI-Teilnehmer
    pub verbindung: Option<ConnectionId>,
    pub kind: ParticipantKind,
    pub name: String,
    pub avatar: String,
    /// Nur fuer KI-Teilnehmer gesetzt
    pub personality: Option<Personality>,
    pub muted: bool,
    pub speaking: bool,
    pub audio_level: f32,
}

impl Participant {
    /// Erstellt einen menschlichen Teilnehmer mit frischer UUID
    pub fn mensch(name: impl Into<String>, avatar: Option<String>, verbindung: ConnectionId) -> Self {
        Self {
            id: ParticipantId::neu_mensch(),
            verbindung: Some(verbindung),
            kind: ParticipantKind::Human,
            name: name.into(),
            avatar: avatar.unwrap_or_else(|| STANDARD_AVATAR.to_string()),
            personality: None,
            muted: false,
            speaking: false,
            audio_level: 0.0,
        }
    }

    /// Erstellt den KI-Teilnehmer mit gegebenem Index aus den Vorlagen
    pub fn ki(raum: &RoomId, index: usize) -> Self {
        let (name, avatar, personality) = KI_VORLAGEN[index % KI_VORLAGEN.len()];
        Self {
            id: ParticipantId::neu_ki(raum, index),
            verbindung: None,
            kind: ParticipantKind::Ai,
            name: name.to_string(),
            avatar: avatar.to_string(),
            personality: Some(personality),
            muted: false,
            speaking: false,
            audio_level: 0.0,
        }
    }

    /// Gibt die oeffentliche Sicht auf den Teilnehmer zurueck
    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            kind: self.kind,
            personality: self.personality,
            muted: self.muted,
            speaking: self.speaking,
            audio_level: self.audio_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Ein aktiver Diskussionsraum
///
/// Existiert nur solange er Teilnehmer hat – das Verzeichnis loescht
/// leere Raeume sofort.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub topic: String,
    pub config_label: String,
    pub created_at: DateTime<Utc>,
    /// Teilnehmer in Beitrittsreihenfolge
    pub teilnehmer: Vec<Participant>,
    /// Wer zuletzt `speaking = true` gemeldet hat (fuer Stille-Verarbeitung)
    pub letzter_sprecher: Option<ParticipantId>,
}

impl Room {
    /// Erstellt einen neuen Raum und saet die konfigurierten KI-Teilnehmer
    pub fn neu(id: RoomId, topic: String, config_label: String) -> Self {
        let mix = mix_fuer_label(&config_label);
        let teilnehmer = (0..mix.ki_anzahl).map(|i| Participant::ki(&id, i)).collect();
        Self {
            id,
            topic,
            config_label,
            created_at: Utc::now(),
            teilnehmer,
            letzter_sprecher: None,
        }
    }

    /// Prueft ob aktuell irgendjemand im Raum spricht
    pub fn spricht_jemand(&self) -> bool {
        self.teilnehmer.iter().any(|t| t.speaking)
    }

    /// Sucht einen Teilnehmer per ID
    pub fn teilnehmer_mit_id(&self, id: &ParticipantId) -> Option<&Participant> {
        self.teilnehmer.iter().find(|t| &t.id == id)
    }

    /// Gibt den ersten menschlichen Teilnehmer zurueck
    pub fn erster_mensch(&self) -> Option<&Participant> {
        self.teilnehmer
            .iter()
            .find(|t| t.kind == ParticipantKind::Human)
    }

    /// Ziel fuer die Stille-Verarbeitung: letzter Sprecher falls noch im
    /// Raum, sonst der erste gefundene Mensch
    pub fn stille_ziel(&self) -> Option<ParticipantId> {
        if let Some(letzter) = &self.letzter_sprecher {
            if self.teilnehmer_mit_id(letzter).is_some() {
                return Some(letzter.clone());
            }
        }
        self.erster_mensch().map(|t| t.id.clone())
    }

    /// Gibt alle KI-Teilnehmer zurueck
    pub fn ki_teilnehmer(&self) -> Vec<&Participant> {
        self.teilnehmer
            .iter()
            .filter(|t| t.kind == ParticipantKind::Ai)
            .collect()
    }

    /// Erstellt den serialisierbaren Schnappschuss fuer Broadcasts
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            topic: self.topic.clone(),
            config_label: self.config_label.clone(),
            created_at: self.created_at,
            status: "active".to_string(),
            participants: self.teilnehmer.iter().map(Participant::info).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_labels_aufloesung() {
        assert_eq!(mix_fuer_label("4ai").ki_anzahl, 4);
        assert_eq!(mix_fuer_label("4real").ki_anzahl, 0);
        assert_eq!(mix_fuer_label("1ai3real").ki_anzahl, 1);
        assert_eq!(mix_fuer_label("1ai3real").menschen_anzahl, 3);
    }

    #[test]
    fn unbekanntes_label_faellt_auf_standard_zurueck() {
        let mix = mix_fuer_label("quatsch");
        assert_eq!(mix.ki_anzahl, 2);
        assert_eq!(mix.menschen_anzahl, 2);
    }

    #[test]
    fn raum_saet_ki_teilnehmer() {
        let raum = Room::neu(RoomId::neu("r1"), "Thema".into(), "3ai1real".into());
        assert_eq!(raum.teilnehmer.len(), 3);
        assert!(raum
            .teilnehmer
            .iter()
            .all(|t| t.kind == ParticipantKind::Ai));
        assert_eq!(raum.teilnehmer[0].id.as_str(), "ai-r1-0");
        assert_eq!(raum.teilnehmer[2].id.as_str(), "ai-r1-2");
    }

    #[test]
    fn ki_vorlagen_zyklisch() {
        let raum_id = RoomId::neu("r");
        let a = Participant::ki(&raum_id, 0);
        let b = Participant::ki(&raum_id, 5); // gleiche Vorlage wie Index 0
        assert_eq!(a.name, b.name);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn stille_ziel_bevorzugt_letzten_sprecher() {
        let mut raum = Room::neu(RoomId::neu("r"), "t".into(), "4real".into());
        let p1 = Participant::mensch("Anna", None, ConnectionId::neu());
        let p2 = Participant::mensch("Ben", None, ConnectionId::neu());
        let p2_id = p2.id.clone();
        raum.teilnehmer.push(p1);
        raum.teilnehmer.push(p2);

        raum.letzter_sprecher = Some(p2_id.clone());
        assert_eq!(raum.stille_ziel(), Some(p2_id));
    }

    #[test]
    fn stille_ziel_faellt_auf_ersten_menschen_zurueck() {
        let mut raum = Room::neu(RoomId::neu("r"), "t".into(), "1ai1real".into());
        let p1 = Participant::mensch("Anna", None, ConnectionId::neu());
        let p1_id = p1.id.clone();
        raum.teilnehmer.push(p1);

        // Letzter Sprecher hat den Raum bereits verlassen
        raum.letzter_sprecher = Some(ParticipantId::neu_mensch());
        assert_eq!(raum.stille_ziel(), Some(p1_id));
    }

    #[test]
    fn snapshot_enthaelt_alle_teilnehmer() {
        let mut raum = Room::neu(RoomId::neu("r"), "Thema".into(), "2ai2real".into());
        raum.teilnehmer
            .push(Participant::mensch("Anna", None, ConnectionId::neu()));

        let snap = raum.snapshot();
        assert_eq!(snap.participants.len(), 3);
        assert_eq!(snap.status, "active");
        assert_eq!(snap.topic, "Thema");
    }
}
