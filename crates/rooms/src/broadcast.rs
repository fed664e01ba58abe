//! Event-Broadcaster – verteilt Server-Ereignisse an verbundene Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Verbindungen und ihre Raum-Zugehoerigkeit.
//!
//! ## Selektives Broadcasting
//! - An einen Raum: `an_raum_senden`
//! - An einen Raum ausser dem Ausloeser: `an_raum_ausser_senden`
//! - An eine einzelne Verbindung: `an_verbindung_senden`

use dashmap::DashMap;
use podium_core::types::{ConnectionId, RoomId};
use podium_protocol::events::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer verbundenen Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Sendet ein Ereignis nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, ereignis: ServerEvent) -> bool {
        match self.tx.try_send(ereignis) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Ereignis verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Send-Queues, indiziert nach Verbindung
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum-Mitgliedschaft: room_id -> Vec<ConnectionId>
    raum_mitglieder: DashMap<RoomId, Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die Verbindungs-Schleife liest aus dieser Queue und sendet via TCP.
    pub fn verbindung_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn verbindung_entfernen(&self, verbindung: &ConnectionId) {
        self.inner.clients.remove(verbindung);
        // Aus allen Raeumen entfernen
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|v| v != verbindung);
        });
        // Leere Raum-Eintraege aufraumen
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
        tracing::debug!(verbindung = %verbindung, "Verbindung aus Broadcaster entfernt");
    }

    /// Fuegt eine Verbindung einem Raum hinzu (fuer selektives Broadcasting)
    ///
    /// Eine Verbindung ist in hoechstens einem Raum.
    pub fn raum_beitreten(&self, verbindung: ConnectionId, raum: RoomId) {
        // Aus altem Raum entfernen
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|v| v != &verbindung);
        });

        self.inner
            .raum_mitglieder
            .entry(raum)
            .or_default()
            .push(verbindung);
    }

    /// Entfernt eine Verbindung aus ihrem Raum
    pub fn raum_verlassen(&self, verbindung: &ConnectionId) {
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|v| v != verbindung);
        });
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
    }

    /// Gibt den Raum zurueck dem eine Verbindung angehoert
    ///
    /// Der Disconnect-Pfad braucht das bevor er aufraumen kann.
    pub fn raum_von_verbindung(&self, verbindung: &ConnectionId) -> Option<RoomId> {
        self.inner
            .raum_mitglieder
            .iter()
            .find(|entry| entry.value().contains(verbindung))
            .map(|entry| entry.key().clone())
    }

    /// Sendet ein Ereignis an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung gefunden und das Ereignis
    /// eingereiht wurde.
    pub fn an_verbindung_senden(&self, verbindung: &ConnectionId, ereignis: ServerEvent) -> bool {
        match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(ereignis),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet ein Ereignis an alle Verbindungen in einem Raum
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_raum_senden(&self, raum: &RoomId, ereignis: ServerEvent) -> usize {
        let verbindungen = match self.inner.raum_mitglieder.get(raum) {
            Some(v) => v.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &verbindungen {
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(ereignis.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet ein Ereignis an alle Verbindungen in einem Raum ausser einer
    ///
    /// Nuetzlich um Join/Leave-Events zu verteilen ohne den Ausloeser zu
    /// informieren.
    pub fn an_raum_ausser_senden(
        &self,
        raum: &RoomId,
        ausgeschlossen: &ConnectionId,
        ereignis: ServerEvent,
    ) -> usize {
        let verbindungen = match self.inner.raum_mitglieder.get(raum) {
            Some(v) => v.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &verbindungen {
            if verbindung == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(ereignis.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn verbindungs_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.inner.clients.contains_key(verbindung)
    }

    /// Gibt alle Verbindungen in einem Raum zurueck
    pub fn mitglieder(&self, raum: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .raum_mitglieder
            .get(raum)
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
