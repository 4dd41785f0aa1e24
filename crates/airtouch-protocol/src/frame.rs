//! Byte-level frame representation for AirTouch messages.
//!
//! A frame is one complete protocol message unit:
//!
//! ```text
//! 55 55 | 80 b0 | id | type | len_hi len_lo | payload... | crc_hi crc_lo
//! ```
//!
//! The message id is a random byte in 1..=255, freshly drawn for every
//! outbound frame. The controller echoes ids in its responses but nothing
//! correlates requests with responses by id; duplicate responses are handled
//! by the request coordinator's queue-drain semantics instead.

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::crc16;
use airtouch_core::constants::{
    ADDRESS_BYTES, FRAME_OVERHEAD, HEADER_BYTES, MSGTYPE_AC_CTRL, MSGTYPE_AC_STAT,
    MSGTYPE_GRP_CTRL, MSGTYPE_GRP_STAT, STATUS_QUERY_PAYLOAD,
};
use airtouch_core::{Error, Result};

/// One protocol message unit (header fields plus payload, without the wire
/// framing bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message id. Random per outbound frame; echoed value on inbound frames.
    pub message_id: u8,

    /// Raw message type code (`MSGTYPE_*`). Kept raw so unknown broadcast
    /// types survive decoding and can be skipped by the dispatcher.
    pub message_type: u8,

    /// Message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Build an outbound frame with a fresh random message id.
    pub fn outbound(message_type: u8, payload: impl Into<Bytes>) -> Self {
        Frame {
            message_id: rand::random_range(1..=255),
            message_type,
            payload: payload.into(),
        }
    }

    /// Build a frame with an explicit message id (inbound frames, tests).
    pub fn with_id(message_id: u8, message_type: u8, payload: impl Into<Bytes>) -> Self {
        Frame {
            message_id,
            message_type,
            payload: payload.into(),
        }
    }

    /// AC control command frame.
    pub fn ac_control(packed: [u8; 4]) -> Self {
        Frame::outbound(MSGTYPE_AC_CTRL, packed.to_vec())
    }

    /// Group control command frame.
    pub fn group_control(packed: [u8; 4]) -> Self {
        Frame::outbound(MSGTYPE_GRP_CTRL, packed.to_vec())
    }

    /// AC status query. Carries the mandatory one-byte dummy payload.
    pub fn ac_status_query() -> Self {
        Frame::outbound(MSGTYPE_AC_STAT, STATUS_QUERY_PAYLOAD.to_vec())
    }

    /// Group status query. Carries the mandatory one-byte dummy payload.
    pub fn group_status_query() -> Self {
        Frame::outbound(MSGTYPE_GRP_STAT, STATUS_QUERY_PAYLOAD.to_vec())
    }

    /// Total size of the frame on the wire.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Serialize to wire format, computing the checksum trailer.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if the payload does not fit the
    /// 16-bit length field.
    pub fn to_wire(&self) -> Result<Bytes> {
        let len = self.payload.len();
        if len > usize::from(u16::MAX) {
            return Err(Error::PayloadTooLarge {
                size: len,
                max_size: usize::from(u16::MAX),
            });
        }

        let mut buf = BytesMut::with_capacity(self.wire_size());
        buf.put_slice(&HEADER_BYTES);
        buf.put_slice(&ADDRESS_BYTES);
        buf.put_u8(self.message_id);
        buf.put_u8(self.message_type);
        buf.put_u16(len as u16);
        buf.put_slice(&self.payload);

        // Checksum covers everything after the magic bytes.
        let crc = crc16(&buf[2..]);
        buf.put_u16(crc);

        Ok(buf.freeze())
    }
}
