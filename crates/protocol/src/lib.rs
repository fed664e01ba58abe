//! podium-protocol – Ereignis-Definitionen und Wire-Format
//!
//! Definiert die JSON-Ereignisse zwischen Client und Server sowie den
//! frame-basierten Codec fuer TCP-Verbindungen.

pub mod events;
pub mod wire;

pub use events::{ClientEvent, ParticipantDescriptor, ParticipantInfo, RoomSnapshot, ServerEvent};
pub use wire::EventCodec;
