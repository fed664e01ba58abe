//! Client-Connection – verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Verbindung wird sofort beim Broadcaster registriert;
//! ihre Empfangs-Queue liefert alle Server-Ereignisse die an diese
//! Verbindung gehen.

use futures_util::{SinkExt, StreamExt};
use podium_core::types::ConnectionId;
use podium_protocol::wire::EventCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::EventDispatcher;
use crate::state::EngineState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `EventCodec`, dispatcht an den `EventDispatcher`
/// und sendet Broadcast-Ereignisse zurueck. Laeuft in einem eigenen
/// tokio-Task.
pub struct ClientConnection {
    state: Arc<EngineState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<EngineState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let verbindung = ConnectionId::neu();
        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Neue Verbindung");

        let mut framed = Framed::new(stream, EventCodec::neu());
        let mut empfang = self.state.broadcaster.verbindung_registrieren(verbindung);
        let dispatcher = EventDispatcher::neu(Arc::clone(&self.state));

        loop {
            tokio::select! {
                // Eingehendes Ereignis vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(ereignis)) => {
                            tracing::trace!(peer = %peer_addr, "Ereignis empfangen");
                            dispatcher.dispatch(ereignis, verbindung).await;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                ausgehend = empfang.recv() => {
                    match ausgehend {
                        Some(ereignis) => {
                            if let Err(e) = framed.send(ereignis).await {
                                tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                                break;
                            }
                        }
                        None => break,
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende: implizites Leave
        dispatcher.verbindung_getrennt(verbindung);
        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Verbindungs-Task beendet");
    }
}
