//! podium-ai – Collaborator-Dienste der KI-Teilnehmer
//!
//! Drei Seams, alle als Traits damit die Engine sie in Tests durch
//! deterministische Stubs ersetzen kann:
//! - [`Transkription`]: Audio zu Text (Whisper-kompatible HTTP-API)
//! - [`SprachSynthese`]: Text zu Audio (ElevenLabs-kompatible HTTP-API)
//! - [`AntwortGenerator`]: Quelltext zu KI-Antwort (Stil-Vorlagen)
//!
//! Dazu [`ZufallsQuelle`] als injizierbare Zufallsquelle fuer Auswahl,
//! Wahrscheinlichkeit und Verzoegerung.

pub mod antwort;
pub mod error;
pub mod synthese;
pub mod transkription;
pub mod zufall;

pub use antwort::{AntwortGenerator, VorlagenAntworten};
pub use error::AiError;
pub use synthese::{ElevenLabsSynthese, SprachSynthese};
pub use transkription::{Transkription, WhisperHttpTranskription};
pub use zufall::{EchteZufallsQuelle, ZufallsQuelle};
