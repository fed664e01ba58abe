//! Audio-Puffer pro (Raum, Teilnehmer)
//!
//! Fragmente werden in Empfangsreihenfolge gesammelt bis eine
//! Transkription sie abholt. Waehrend einer laufenden Transkription ist
//! der Puffer gesperrt: neue Fragmente werden weiter angehaengt, aber
//! ein zweites `entleeren` liefert nichts – so transkribiert hoechstens
//! ein Auftrag gleichzeitig denselben Teilnehmer.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use podium_core::types::{ParticipantId, RoomId};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// Ein einzelnes rohes Audio-Fragment
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub daten: Vec<u8>,
    pub empfangen: DateTime<Utc>,
}

impl AudioChunk {
    pub fn neu(daten: Vec<u8>) -> Self {
        Self {
            daten,
            empfangen: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioPuffer
// ---------------------------------------------------------------------------

/// Gesammelte Fragmente eines Teilnehmers
#[derive(Debug, Default)]
struct AudioPuffer {
    chunks: Vec<AudioChunk>,
    /// Gesetzt solange eine Transkription die Fragmente verarbeitet
    gesperrt: bool,
}

// ---------------------------------------------------------------------------
// AudioBufferManager
// ---------------------------------------------------------------------------

/// Standard-Obergrenze fuer das Puffer-Alter (30 Sekunden)
pub const STANDARD_MAX_ALTER: Duration = Duration::from_secs(30);

/// Verwaltet die Audio-Puffer aller Teilnehmer
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct AudioBufferManager {
    inner: Arc<AudioBufferManagerInner>,
}

struct AudioBufferManagerInner {
    puffer: DashMap<(RoomId, ParticipantId), AudioPuffer>,
    /// Fragmente aelter als dieses Limit werden beim Anhaengen verworfen
    max_alter: ChronoDuration,
}

impl AudioBufferManager {
    /// Erstellt einen Manager mit Standard-Alterslimit
    pub fn neu() -> Self {
        Self::mit_max_alter(STANDARD_MAX_ALTER)
    }

    /// Erstellt einen Manager mit benutzerdefiniertem Alterslimit
    pub fn mit_max_alter(max_alter: Duration) -> Self {
        Self {
            inner: Arc::new(AudioBufferManagerInner {
                puffer: DashMap::new(),
                max_alter: ChronoDuration::from_std(max_alter)
                    .unwrap_or_else(|_| ChronoDuration::seconds(30)),
            }),
        }
    }

    /// Haengt ein Fragment an den Puffer eines Teilnehmers an
    ///
    /// Der Puffer wird bei Bedarf angelegt. Fragmente die das Alterslimit
    /// ueberschreiten werden dabei verworfen (aelteste zuerst).
    pub fn chunk_anhaengen(&self, raum: &RoomId, teilnehmer: &ParticipantId, daten: Vec<u8>) {
        let mut eintrag = self
            .inner
            .puffer
            .entry((raum.clone(), teilnehmer.clone()))
            .or_default();

        eintrag.chunks.push(AudioChunk::neu(daten));

        // Alterslimit durchsetzen
        let limit = Utc::now() - self.inner.max_alter;
        let vorher = eintrag.chunks.len();
        eintrag.chunks.retain(|c| c.empfangen >= limit);
        let verworfen = vorher - eintrag.chunks.len();
        if verworfen > 0 {
            tracing::debug!(
                raum = %raum,
                teilnehmer = %teilnehmer,
                verworfen,
                "Veraltete Audio-Fragmente verworfen"
            );
        }
    }

    /// Entnimmt alle gepufferten Fragmente und sperrt den Puffer
    ///
    /// Gibt `None` zurueck wenn der Puffer leer, abwesend oder bereits
    /// gesperrt ist. Der Aufrufer MUSS nach Abschluss `freigeben` rufen.
    pub fn entleeren(
        &self,
        raum: &RoomId,
        teilnehmer: &ParticipantId,
    ) -> Option<Vec<AudioChunk>> {
        let mut eintrag = self
            .inner
            .puffer
            .get_mut(&(raum.clone(), teilnehmer.clone()))?;
        if eintrag.gesperrt {
            tracing::debug!(
                raum = %raum,
                teilnehmer = %teilnehmer,
                "Puffer gesperrt – Transkription laeuft bereits"
            );
            return None;
        }
        if eintrag.chunks.is_empty() {
            return None;
        }
        eintrag.gesperrt = true;
        Some(std::mem::take(&mut eintrag.chunks))
    }

    /// Leert den Puffer und hebt die Sperre auf
    ///
    /// Wird nach jeder Transkription gerufen, auch bei Fehlschlag –
    /// Fragmente die waehrend der Verarbeitung eintrafen werden mit
    /// verworfen (sie gehoeren zur bereits verarbeiteten Aeusserung).
    pub fn freigeben(&self, raum: &RoomId, teilnehmer: &ParticipantId) {
        if let Some(mut eintrag) = self
            .inner
            .puffer
            .get_mut(&(raum.clone(), teilnehmer.clone()))
        {
            eintrag.chunks.clear();
            eintrag.gesperrt = false;
        }
    }

    /// Entfernt den Puffer eines Teilnehmers vollstaendig
    pub fn entfernen(&self, raum: &RoomId, teilnehmer: &ParticipantId) {
        self.inner
            .puffer
            .remove(&(raum.clone(), teilnehmer.clone()));
    }

    /// Entfernt alle Puffer eines Raums
    pub fn raum_entfernen(&self, raum: &RoomId) {
        self.inner.puffer.retain(|(r, _), _| r != raum);
    }

    /// Empfangszeitpunkt des aeltesten gepufferten Fragments
    pub fn gestartet_um(&self, raum: &RoomId, teilnehmer: &ParticipantId) -> Option<DateTime<Utc>> {
        self.inner
            .puffer
            .get(&(raum.clone(), teilnehmer.clone()))
            .and_then(|p| p.chunks.first().map(|c| c.empfangen))
    }

    /// Empfangszeitpunkt des juengsten gepufferten Fragments
    pub fn letzter_chunk_um(
        &self,
        raum: &RoomId,
        teilnehmer: &ParticipantId,
    ) -> Option<DateTime<Utc>> {
        self.inner
            .puffer
            .get(&(raum.clone(), teilnehmer.clone()))
            .and_then(|p| p.chunks.last().map(|c| c.empfangen))
    }

    /// Gibt die Anzahl gepufferter Fragmente eines Teilnehmers zurueck
    pub fn chunk_anzahl(&self, raum: &RoomId, teilnehmer: &ParticipantId) -> usize {
        self.inner
            .puffer
            .get(&(raum.clone(), teilnehmer.clone()))
            .map(|p| p.chunks.len())
            .unwrap_or(0)
    }
}

impl Default for AudioBufferManager {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
