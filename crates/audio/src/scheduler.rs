//! Aktivitaets-Timer – verzoegerte, abbrechbare Aufgaben pro Schluessel
//!
//! Pro Schluessel laeuft hoechstens ein Timer: erneutes Scharfstellen
//! bricht den vorherigen ab. Abgelaufene Timer entfernen sich selbst aus
//! der Tabelle bevor ihre Aufgabe startet. Abbrechen eines bereits
//! gefeuerten Timers ist ein No-Op.

use dashmap::DashMap;
use podium_core::types::{ParticipantId, RoomId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// TimerKey
// ---------------------------------------------------------------------------

/// Identitaet eines schlafenden Timers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Stille-Erkennung eines Raums (einer pro Raum)
    Stille(RoomId),
    /// Dauersprecher-Erkennung eines Teilnehmers
    Dauersprecher(RoomId, ParticipantId),
    /// Verzoegerte KI-Antwort (Sequenznummer erlaubt mehrere pro Raum)
    AntwortVerzoegerung(RoomId, u64),
}

impl TimerKey {
    /// Gibt den Raum zurueck zu dem der Timer gehoert
    pub fn raum_id(&self) -> &RoomId {
        match self {
            TimerKey::Stille(raum) => raum,
            TimerKey::Dauersprecher(raum, _) => raum,
            TimerKey::AntwortVerzoegerung(raum, _) => raum,
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityScheduler
// ---------------------------------------------------------------------------

/// Verwaltet alle schlafenden Timer der Aktivitaets-Erkennung
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ActivityScheduler {
    inner: Arc<ActivitySchedulerInner>,
}

struct ActivitySchedulerInner {
    timer: DashMap<TimerKey, JoinHandle<()>>,
}

impl ActivityScheduler {
    /// Erstellt einen neuen leeren Scheduler
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ActivitySchedulerInner {
                timer: DashMap::new(),
            }),
        }
    }

    /// Stellt einen Timer scharf; ein bestehender Timer mit demselben
    /// Schluessel wird vorher abgebrochen
    ///
    /// Die Aufgabe laeuft nach Ablauf der Verzoegerung auf einem eigenen
    /// Task. Der Timer entfernt sich selbst aus der Tabelle BEVOR die
    /// Aufgabe startet, damit die Aufgabe denselben Schluessel neu
    /// scharfstellen kann (Dauersprecher-Wiederholung).
    pub fn scharf_stellen<F>(&self, schluessel: TimerKey, verzoegerung: Duration, aufgabe: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tabelle = Arc::clone(&self.inner);
        let eigener_schluessel = schluessel.clone();
        // Frist ab dem Scharfstellen messen, nicht ab dem ersten Poll des
        // Tasks – sonst verschiebt die Task-Einplanung den Ablauf
        let frist = tokio::time::Instant::now() + verzoegerung;

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(frist).await;
            tabelle.timer.remove(&eigener_schluessel);
            aufgabe.await;
        });

        if let Some(alter) = self.inner.timer.insert(schluessel.clone(), handle) {
            alter.abort();
            tracing::trace!(?schluessel, "Bestehender Timer ersetzt");
        }
    }

    /// Bricht einen Timer ab
    ///
    /// Gibt `true` zurueck wenn ein schlafender Timer abgebrochen wurde.
    pub fn abbrechen(&self, schluessel: &TimerKey) -> bool {
        match self.inner.timer.remove(schluessel) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Bricht alle Timer eines Raums ab
    pub fn raum_abbrechen(&self, raum: &RoomId) {
        let schluessel: Vec<TimerKey> = self
            .inner
            .timer
            .iter()
            .filter(|e| e.key().raum_id() == raum)
            .map(|e| e.key().clone())
            .collect();
        for s in schluessel {
            self.abbrechen(&s);
        }
    }

    /// Bricht alle Timer eines Teilnehmers ab (Dauersprecher)
    pub fn teilnehmer_abbrechen(&self, raum: &RoomId, teilnehmer: &ParticipantId) {
        self.abbrechen(&TimerKey::Dauersprecher(raum.clone(), teilnehmer.clone()));
    }

    /// Prueft ob ein Timer aktuell schlaeft
    pub fn aktiv(&self, schluessel: &TimerKey) -> bool {
        self.inner.timer.contains_key(schluessel)
    }

    /// Gibt die Anzahl schlafender Timer zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.timer.len()
    }
}

impl Default for ActivityScheduler {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
