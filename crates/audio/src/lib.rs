//! podium-audio – Audio-Pufferung und Aktivitaets-Timer
//!
//! Sammelt rohe Audio-Fragmente pro (Raum, Teilnehmer) bis eine
//! Transkription sie abholt, und verwaltet die schlafenden Timer der
//! Aktivitaets-Erkennung (Stille, Dauersprecher, Antwort-Verzoegerung).

pub mod buffer;
pub mod scheduler;

pub use buffer::{AudioBufferManager, AudioChunk};
pub use scheduler::{ActivityScheduler, TimerKey};
