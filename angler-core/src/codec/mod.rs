//! `tokio_util` codec for the game's unframed text stream.
//!
//! Inbound data has no framing: the decoder hands out whatever text has
//! arrived, holding back only an incomplete trailing UTF-8 sequence so a
//! multi-byte character split across reads is never mangled.
//! Outbound data is a [`Command`] rendered to its wire form.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::AnglerError;
use crate::message::Command;

/// Upper bound on buffered undecoded bytes before the peer is treated
/// as broken.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct GameCodec {}

impl GameCodec {
    pub fn new() -> Self {
        Self {}
    }
}

impl Decoder for GameCodec {
    type Item = String;
    type Error = AnglerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        if src.len() > MAX_CHUNK_SIZE {
            return Err(AnglerError::from("chunk size exceeded"));
        }

        let ready = match std::str::from_utf8(src) {
            Ok(_) => src.len(),
            Err(e) => match e.error_len() {
                // Truncated sequence at the tail: wait for the rest.
                None => e.valid_up_to(),
                // Genuinely invalid bytes: hand everything over lossily.
                Some(_) => src.len(),
            },
        };
        if ready == 0 {
            return Ok(None);
        }

        let raw = src.split_to(ready);
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let raw = src.split();
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }
}

impl Encoder<Command> for GameCodec {
    type Error = AnglerError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = item.to_wire();
        dst.reserve(wire.len());
        dst.put_slice(wire.as_bytes());
        Ok(())
    }
}
