//! podium-rooms – Raum-Verzeichnis, Teilnehmer-Operationen und Broadcaster
//!
//! Haelt den ephemeren In-Memory-Zustand aller aktiven Diskussionsraeume.
//! Raeume sind vollstaendig unabhaengige Nebenlaeufigkeits-Einheiten und
//! teilen keinen veraenderlichen Zustand untereinander.

pub mod broadcast;
pub mod registry;
pub mod room;

pub use broadcast::EventBroadcaster;
pub use registry::{RoomRegistry, SprechStatusWechsel};
pub use room::{mix_fuer_label, Participant, Room, TeilnehmerMix};
