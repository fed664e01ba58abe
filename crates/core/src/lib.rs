//! podium-core – Gemeinsame Typen, Identifikatoren und Fehlertypen
//!
//! Dieses Crate enthaelt alles was mehrere Podium-Crates teilen:
//! ID-Newtypes, Teilnehmer-Klassifikation und den zentralen Fehler-Enum.

pub mod error;
pub mod types;

pub use error::{PodiumError, Result};
