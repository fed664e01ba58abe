//! Wire-Format fuer TCP-Verbindungen
//!
//! Jedes Ereignis reist als ein Frame: ein u32-Laengenfeld (big-endian)
//! gefolgt von den JSON-Bytes des Ereignisses. Das Laengenfeld zaehlt
//! nur die Payload. Base64-kodierte Audio-Chunks sind die groessten
//! erwarteten Frames, daher liegt das Standard-Limit bei 1 MB.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::events::ClientEvent;

/// Standard-Limit fuer die Payload-Groesse eines Frames (1 MB)
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Breite des Laengenfelds
pub const LAENGEN_FELD_BYTES: usize = 4;

// ---------------------------------------------------------------------------
// EventCodec
// ---------------------------------------------------------------------------

/// Codec fuer die serverseitige Ereignis-Verbindung
///
/// Die Decode-Seite liefert `ClientEvent`; die Encode-Seite nimmt alles
/// Serialisierbare an (im Serverbetrieb `ServerEvent`, in Tests auch
/// `ClientEvent`).
#[derive(Debug, Clone)]
pub struct EventCodec {
    limit: usize,
}

impl EventCodec {
    /// Codec mit dem Standard-Limit
    pub fn neu() -> Self {
        Self::mit_limit(MAX_FRAME_BYTES)
    }

    /// Codec mit eigenem Payload-Limit
    pub fn mit_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Gibt das konfigurierte Payload-Limit zurueck
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn laenge_pruefen(&self, laenge: usize) -> io::Result<()> {
        if laenge > self.limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Frame ueberschreitet das Limit: {laenge} > {} Bytes", self.limit),
            ));
        }
        Ok(())
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::neu()
    }
}

impl Decoder for EventCodec {
    type Item = ClientEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LAENGEN_FELD_BYTES {
            return Ok(None);
        }

        // Laengenfeld nur anschauen, noch nicht verbrauchen
        let mut feld = [0u8; LAENGEN_FELD_BYTES];
        feld.copy_from_slice(&src[..LAENGEN_FELD_BYTES]);
        let laenge = u32::from_be_bytes(feld) as usize;
        self.laenge_pruefen(laenge)?;

        let gesamt = LAENGEN_FELD_BYTES + laenge;
        if src.len() < gesamt {
            src.reserve(gesamt - src.len());
            return Ok(None);
        }

        src.advance(LAENGEN_FELD_BYTES);
        let payload = src.split_to(laenge);

        let ereignis = serde_json::from_slice(&payload).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unlesbares Ereignis im Frame: {e}"),
            )
        })?;
        Ok(Some(ereignis))
    }
}

impl<T: Serialize> Encoder<T> for EventCodec {
    type Error = io::Error;

    fn encode(&mut self, ereignis: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&ereignis).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Ereignis nicht serialisierbar: {e}"),
            )
        })?;
        self.laenge_pruefen(json.len())?;

        dst.reserve(LAENGEN_FELD_BYTES + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
