//! Injizierbare Zufallsquelle
//!
//! Die Engine wuerfelt an drei Stellen: Auswahl des antwortenden
//! KI-Teilnehmers, Wahrscheinlichkeit der Sekundaer-Antwort und die
//! Antwort-Verzoegerung. Hinter einem Trait, damit Tests deterministisch
//! bleiben.

use rand::Rng;
use std::time::Duration;

/// Quelle aller Zufallsentscheidungen der Engine
pub trait ZufallsQuelle: Send + Sync {
    /// Gleichverteilter Index in `0..len` (`len` > 0)
    fn index(&self, len: usize) -> usize;

    /// Gleichverteilter Wert in `[0, 1)`
    fn wahrscheinlichkeit(&self) -> f64;

    /// Gleichverteilte Dauer in `[min, max)`
    fn dauer_zwischen(&self, min: Duration, max: Duration) -> Duration;
}

/// Produktions-Implementierung auf Basis des Thread-RNG
pub struct EchteZufallsQuelle;

impl ZufallsQuelle for EchteZufallsQuelle {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn wahrscheinlichkeit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn dauer_zwischen(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let spanne = (max - min).as_millis() as u64;
        min + Duration::from_millis(rand::thread_rng().gen_range(0..spanne))
    }
}
