//! Raum-Verzeichnis – besitzt den Zustand aller aktiven Raeume
//!
//! Thread-safe via Arc + DashMap. Alle Mutationen eines Raums laufen
//! unter dem Entry-Lock seines DashMap-Eintrags – insbesondere ist das
//! "alle loeschen, dann einen setzen" der Single-Speaker-Invariante
//! dadurch atomar gegenueber allen anderen Raum-Operationen.
//!
//! Operationen auf abwesenden Raeumen oder Teilnehmern sind geloggte
//! No-Ops – eine abgelaufene Raum-ID darf den Aufrufer niemals crashen.

use dashmap::DashMap;
use podium_core::types::{ConnectionId, ParticipantId, RoomId};
use podium_protocol::events::{ParticipantInfo, RoomSnapshot};
use std::sync::Arc;

use crate::room::{Participant, Room, STANDARD_MIX_LABEL, STANDARD_THEMA};

// ---------------------------------------------------------------------------
// SprechStatusWechsel
// ---------------------------------------------------------------------------

/// Ergebnis einer Sprech-Status-Aenderung
///
/// Meldet dem Aufrufer ob das Praedikat "irgendjemand spricht" gekippt
/// ist (Stille-Timer stellen/abbrechen) und ob der Teilnehmer selbst
/// vorher schon sprach – Pegel-Updates eines laufenden Sprechers duerfen
/// dessen Dauersprecher-Timer nicht neu starten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprechStatusWechsel {
    /// Sprach vor der Aenderung irgendjemand?
    pub jemand_vorher: bool,
    /// Spricht nach der Aenderung irgendjemand?
    pub jemand_nachher: bool,
    /// Sprach der Teilnehmer selbst vor der Aenderung?
    pub selbst_vorher: bool,
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

/// Verzeichnis aller aktiven Raeume
///
/// Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RoomRegistryInner>,
}

struct RoomRegistryInner {
    raeume: DashMap<RoomId, Room>,
}

impl RoomRegistry {
    /// Erstellt ein neues leeres Verzeichnis
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RoomRegistryInner {
                raeume: DashMap::new(),
            }),
        }
    }

    /// Erstellt den Raum falls er fehlt, sonst wird er unveraendert
    /// zurueckgegeben (idempotent; `topic` und `config_label` werden bei
    /// bestehenden Raeumen ignoriert)
    ///
    /// Bei der Erstellung werden die konfigurierten KI-Teilnehmer gesaet.
    pub fn raum_erstellen_oder_holen(
        &self,
        raum_id: &RoomId,
        topic: Option<String>,
        config_label: Option<String>,
    ) -> RoomSnapshot {
        let eintrag = self.inner.raeume.entry(raum_id.clone()).or_insert_with(|| {
            let label = config_label.unwrap_or_else(|| STANDARD_MIX_LABEL.to_string());
            let thema = topic.unwrap_or_else(|| STANDARD_THEMA.to_string());
            let raum = Room::neu(raum_id.clone(), thema, label.clone());
            tracing::info!(
                raum = %raum_id,
                label = %label,
                ki_anzahl = raum.teilnehmer.len(),
                "Raum erstellt"
            );
            raum
        });
        eintrag.snapshot()
    }

    /// Gibt den Schnappschuss eines Raums zurueck
    pub fn raum(&self, raum_id: &RoomId) -> Option<RoomSnapshot> {
        self.inner.raeume.get(raum_id).map(|r| r.snapshot())
    }

    /// Prueft ob ein Raum existiert
    pub fn existiert(&self, raum_id: &RoomId) -> bool {
        self.inner.raeume.contains_key(raum_id)
    }

    /// Prueft ob ein Teilnehmer in einem Raum existiert
    pub fn teilnehmer_existiert(&self, raum_id: &RoomId, teilnehmer_id: &ParticipantId) -> bool {
        self.inner
            .raeume
            .get(raum_id)
            .map(|r| r.teilnehmer_mit_id(teilnehmer_id).is_some())
            .unwrap_or(false)
    }

    /// Loescht den Raum wenn er keine Teilnehmer mehr hat
    ///
    /// Dies ist der EINZIGE Pfad der Raum-Zustand loescht; wird nach
    /// jedem Leave/Disconnect aufgerufen. KI-Teilnehmer zaehlen mit –
    /// ein Raum mit nur KI-Teilnehmern bleibt bestehen solange sie
    /// nicht mit dem letzten Menschen entfernt wurden.
    pub fn raum_entfernen_wenn_leer(&self, raum_id: &RoomId) -> bool {
        let entfernt = self
            .inner
            .raeume
            .remove_if(raum_id, |_, raum| raum.teilnehmer.is_empty())
            .is_some();
        if entfernt {
            tracing::info!(raum = %raum_id, "Raum geloescht (keine Teilnehmer)");
        }
        entfernt
    }

    // -----------------------------------------------------------------------
    // Teilnehmer-Operationen
    // -----------------------------------------------------------------------

    /// Fuegt einen Teilnehmer hinzu und gibt den neuen Schnappschuss zurueck
    pub fn beitreten(&self, raum_id: &RoomId, teilnehmer: Participant) -> Option<RoomSnapshot> {
        let mut raum = match self.inner.raeume.get_mut(raum_id) {
            Some(r) => r,
            None => {
                tracing::warn!(raum = %raum_id, "Beitritt zu unbekanntem Raum");
                return None;
            }
        };
        tracing::info!(
            raum = %raum_id,
            teilnehmer = %teilnehmer.id,
            name = %teilnehmer.name,
            "Teilnehmer beigetreten"
        );
        raum.teilnehmer.push(teilnehmer);
        Some(raum.snapshot())
    }

    /// Entfernt einen Teilnehmer per ID
    pub fn verlassen(
        &self,
        raum_id: &RoomId,
        teilnehmer_id: &ParticipantId,
    ) -> Option<Participant> {
        let mut raum = self.inner.raeume.get_mut(raum_id)?;
        let pos = raum.teilnehmer.iter().position(|t| &t.id == teilnehmer_id)?;
        let entfernt = raum.teilnehmer.remove(pos);
        tracing::info!(raum = %raum_id, teilnehmer = %teilnehmer_id, "Teilnehmer hat Raum verlassen");
        Some(entfernt)
    }

    /// Entfernt einen Teilnehmer anhand seiner Verbindung
    ///
    /// Der Disconnect-Pfad kennt die Teilnehmer-ID nicht zuverlaessig,
    /// nur das Verbindungs-Handle.
    pub fn verlassen_nach_verbindung(
        &self,
        raum_id: &RoomId,
        verbindung: &ConnectionId,
    ) -> Option<Participant> {
        let mut raum = self.inner.raeume.get_mut(raum_id)?;
        let pos = raum
            .teilnehmer
            .iter()
            .position(|t| t.verbindung.as_ref() == Some(verbindung))?;
        let entfernt = raum.teilnehmer.remove(pos);
        tracing::info!(
            raum = %raum_id,
            teilnehmer = %entfernt.id,
            "Teilnehmer nach Verbindungsabbruch entfernt"
        );
        Some(entfernt)
    }

    /// Setzt den Sprech-Status und erzwingt die Single-Speaker-Invariante
    ///
    /// Bei `speaking = true` wird zuerst das Flag ALLER anderen Teilnehmer
    /// geloescht, dann das Ziel gesetzt – beides unter demselben
    /// Entry-Lock, ohne Suspension dazwischen. Unbekannter Teilnehmer:
    /// stiller No-Op (Netzwerk-Race mit Leave).
    pub fn sprechstatus_setzen(
        &self,
        raum_id: &RoomId,
        teilnehmer_id: &ParticipantId,
        speaking: bool,
        audio_level: f32,
    ) -> Option<SprechStatusWechsel> {
        let mut raum = match self.inner.raeume.get_mut(raum_id) {
            Some(r) => r,
            None => {
                tracing::debug!(raum = %raum_id, "Sprech-Status fuer unbekannten Raum");
                return None;
            }
        };
        if raum.teilnehmer_mit_id(teilnehmer_id).is_none() {
            tracing::debug!(
                raum = %raum_id,
                teilnehmer = %teilnehmer_id,
                "Sprech-Status fuer unbekannten Teilnehmer"
            );
            return None;
        }

        let jemand_vorher = raum.spricht_jemand();
        let selbst_vorher = raum
            .teilnehmer_mit_id(teilnehmer_id)
            .map(|t| t.speaking)
            .unwrap_or(false);

        if speaking {
            // Alle loeschen, dann das Ziel setzen – atomar unter dem Entry-Lock
            for t in raum.teilnehmer.iter_mut() {
                t.speaking = false;
            }
            raum.letzter_sprecher = Some(teilnehmer_id.clone());
        }
        for t in raum.teilnehmer.iter_mut() {
            if &t.id == teilnehmer_id {
                t.speaking = speaking;
                t.audio_level = audio_level;
            }
        }

        let jemand_nachher = raum.spricht_jemand();
        Some(SprechStatusWechsel {
            jemand_vorher,
            jemand_nachher,
            selbst_vorher,
        })
    }

    /// Setzt das Mute-Flag eines Teilnehmers (reine Feld-Aenderung)
    pub fn stumm_setzen(
        &self,
        raum_id: &RoomId,
        teilnehmer_id: &ParticipantId,
        muted: bool,
    ) -> bool {
        let mut raum = match self.inner.raeume.get_mut(raum_id) {
            Some(r) => r,
            None => return false,
        };
        match raum.teilnehmer.iter_mut().find(|t| &t.id == teilnehmer_id) {
            Some(t) => {
                t.muted = muted;
                true
            }
            None => {
                tracing::debug!(
                    raum = %raum_id,
                    teilnehmer = %teilnehmer_id,
                    "Mute fuer unbekannten Teilnehmer"
                );
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen fuer Orchestrierung und Timer
    // -----------------------------------------------------------------------

    /// Prueft ob im Raum irgendjemand spricht
    pub fn spricht_jemand(&self, raum_id: &RoomId) -> bool {
        self.inner
            .raeume
            .get(raum_id)
            .map(|r| r.spricht_jemand())
            .unwrap_or(false)
    }

    /// Prueft ob ein Teilnehmer aktuell als sprechend markiert ist
    pub fn spricht(&self, raum_id: &RoomId, teilnehmer_id: &ParticipantId) -> bool {
        self.inner
            .raeume
            .get(raum_id)
            .and_then(|r| r.teilnehmer_mit_id(teilnehmer_id).map(|t| t.speaking))
            .unwrap_or(false)
    }

    /// Ziel der Stille-Verarbeitung (letzter Sprecher, sonst erster Mensch)
    pub fn stille_ziel(&self, raum_id: &RoomId) -> Option<ParticipantId> {
        self.inner.raeume.get(raum_id)?.stille_ziel()
    }

    /// Gibt die oeffentliche Sicht aller KI-Teilnehmer eines Raums zurueck
    pub fn ki_teilnehmer(&self, raum_id: &RoomId) -> Vec<ParticipantInfo> {
        self.inner
            .raeume
            .get(raum_id)
            .map(|r| r.ki_teilnehmer().iter().map(|t| t.info()).collect())
            .unwrap_or_default()
    }

    /// Gibt die Anzahl aktiver Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.inner.raeume.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
