//! podium-engine – Sitzungs-Engine
//!
//! Verbindet alle Bausteine zu einem lauffaehigen Server: TCP-Listener,
//! Ereignis-Dispatch, Aktivitaets-Erkennung (Stille, Dauersprecher) und
//! KI-Orchestrierung (Transkription, Antwort, Synthese).
//!
//! ## Ablauf einer Aeusserung
//! 1. Client meldet `speaking-status` und streamt `audio-chunk`s
//! 2. Ein Aktivitaets-Timer feuert (Stille nach 5 s, Dauersprecher alle 10 s)
//! 3. Die Pipeline entleert den Audio-Puffer und transkribiert
//! 4. Das Transkript wird an den Raum verteilt
//! 5. Der Orchestrator waehlt einen KI-Teilnehmer, generiert eine Antwort
//!    und stellt sie nach 2–5 s Verzoegerung (mit Audio, falls die
//!    Synthese gelingt) in den Raum

pub mod connection;
pub mod dispatcher;
pub mod orchestrator;
pub mod pipeline;
pub mod state;
pub mod tcp;
pub mod timers;

pub use connection::ClientConnection;
pub use dispatcher::EventDispatcher;
pub use state::{EngineConfig, EngineState};
pub use tcp::EngineServer;
