//! Antwort-Generierung der KI-Teilnehmer
//!
//! Antworten kommen aus festen Vorlagen-Pools pro Antwort-Stil; der
//! Quelltext der ausloesenden Aeusserung beeinflusst aktuell nur das
//! Logging, nicht die Auswahl.

use podium_core::types::Personality;
use std::sync::Arc;

use crate::zufall::ZufallsQuelle;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Erzeugt den Antwort-Text eines KI-Teilnehmers
pub trait AntwortGenerator: Send + Sync {
    /// Generiert eine Antwort auf `quelle_text`
    ///
    /// Ohne Stil-Angabe wird der analytische Pool verwendet.
    fn antwort_generieren(&self, quelle_text: &str, personality: Option<Personality>) -> String;
}

// ---------------------------------------------------------------------------
// Vorlagen-Pools
// ---------------------------------------------------------------------------

const ANALYTICAL: [&str; 4] = [
    "That's an interesting point. Let me analyze this from a data-driven perspective...",
    "From a logical standpoint, I can see several factors at play here...",
    "This raises some important questions that we should consider systematically...",
    "Let me break this down into its core components...",
];

const CREATIVE: [&str; 4] = [
    "That's a fascinating perspective! What if we looked at this from a completely different angle?",
    "I love how you're thinking outside the box. Here's a creative approach...",
    "This reminds me of an innovative solution I've been considering...",
    "What if we reimagined this problem entirely?",
];

const SUPPORTIVE: [&str; 4] = [
    "That's a great contribution to our discussion! I really appreciate your insight.",
    "You've made an excellent point. Let me build on that...",
    "I think you're onto something important here. Let's explore this further...",
    "Thank you for sharing that perspective. It adds valuable depth to our conversation.",
];

const TECHNICAL: [&str; 4] = [
    "From a technical perspective, there are several important considerations here...",
    "Let me provide some technical context that might be relevant...",
    "This touches on some fundamental technical principles...",
    "From an engineering standpoint, we should consider...",
];

const FACILITATOR: [&str; 4] = [
    "Great discussion point! Let's make sure everyone has a chance to share their thoughts on this.",
    "This is a key topic. How do others feel about this perspective?",
    "Let's explore this further. What are the different viewpoints here?",
    "This is an important aspect of our discussion. Let's dive deeper into this.",
];

fn pool_fuer(personality: Option<Personality>) -> &'static [&'static str] {
    match personality.unwrap_or(Personality::Analytical) {
        Personality::Analytical => &ANALYTICAL,
        Personality::Creative => &CREATIVE,
        Personality::Supportive => &SUPPORTIVE,
        Personality::Technical => &TECHNICAL,
        Personality::Facilitator => &FACILITATOR,
    }
}

// ---------------------------------------------------------------------------
// VorlagenAntworten
// ---------------------------------------------------------------------------

/// Vorlagen-basierter Antwort-Generator
pub struct VorlagenAntworten {
    zufall: Arc<dyn ZufallsQuelle>,
}

impl VorlagenAntworten {
    pub fn neu(zufall: Arc<dyn ZufallsQuelle>) -> Self {
        Self { zufall }
    }
}

impl AntwortGenerator for VorlagenAntworten {
    fn antwort_generieren(&self, quelle_text: &str, personality: Option<Personality>) -> String {
        let pool = pool_fuer(personality);
        let antwort = pool[self.zufall.index(pool.len())];
        tracing::debug!(
            quelle_laenge = quelle_text.len(),
            ?personality,
            "KI-Antwort aus Vorlagen-Pool gewaehlt"
        );
        antwort.to_string()
    }
}
