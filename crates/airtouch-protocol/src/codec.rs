//! Tokio codec for AirTouch frame framing.
//!
//! Implements [`Decoder`]/[`Encoder`] over the raw TCP byte stream. The
//! decoder accumulates bytes until a full header, declared-length payload and
//! checksum trailer are present, so frames split across (or packed into) TCP
//! segments decode correctly regardless of how the socket delivers them.
//!
//! Error posture, matching the controller's observed behavior:
//! - Magic/address mismatch is logged as a warning and parsing continues
//!   using the declared length field.
//! - A checksum mismatch drops the frame silently and resumes parsing
//!   immediately after the frame's declared extent. No scan for the next
//!   magic sequence is attempted.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::checksum::crc16;
use crate::frame::Frame;
use airtouch_core::constants::{ADDRESS_BYTES, FRAME_PREFIX_LEN, HEADER_BYTES};
use airtouch_core::{Error, Result};

/// Codec translating between [`Frame`] values and AirTouch wire bytes.
#[derive(Debug, Default)]
pub struct AirtouchCodec;

impl AirtouchCodec {
    pub fn new() -> Self {
        AirtouchCodec
    }
}

impl Decoder for AirtouchCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            if src.len() < FRAME_PREFIX_LEN {
                return Ok(None);
            }

            // Inbound frames carry the address pair in reply order; the
            // controller's originator byte lands at index 3.
            if src[0] != HEADER_BYTES[0]
                || src[1] != HEADER_BYTES[1]
                || src[3] != ADDRESS_BYTES[0]
            {
                warn!(
                    header = ?&src[..4],
                    "invalid frame header, continuing with declared length"
                );
            }

            let payload_len = usize::from(u16::from_be_bytes([src[6], src[7]]));
            let total = FRAME_PREFIX_LEN + payload_len + 2;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            let wire = src.split_to(total);
            let expected = u16::from_be_bytes([wire[total - 2], wire[total - 1]]);
            let actual = crc16(&wire[2..total - 2]);
            if actual != expected {
                // Drop the frame and resume at the fixed offset after its
                // declared extent.
                warn!(expected, actual, "discarding frame with bad checksum");
                continue;
            }

            let frame = Frame::with_id(
                wire[4],
                wire[5],
                Bytes::copy_from_slice(&wire[FRAME_PREFIX_LEN..total - 2]),
            );
            trace!(
                message_id = frame.message_id,
                message_type = format_args!("{:#04x}", frame.message_type),
                payload_len,
                "decoded frame"
            );
            return Ok(Some(frame));
        }
    }
}

impl Encoder<Frame> for AirtouchCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let wire = item.to_wire()?;
        trace!(
            message_id = item.message_id,
            message_type = format_args!("{:#04x}", item.message_type),
            wire_len = wire.len(),
            "encoded frame"
        );
        dst.extend_from_slice(&wire);
        Ok(())
    }
}
