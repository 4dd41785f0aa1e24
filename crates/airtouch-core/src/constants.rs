//! Protocol constants for the AirTouch touchpad controller.
//!
//! The controller speaks a cleartext binary protocol over TCP port 9004.
//! Every message is one frame:
//!
//! ```text
//! 55 55 | 80 b0 | id | type | len_hi len_lo | payload... | crc_hi crc_lo
//! ```
//!
//! Where:
//! - `55 55` - magic header bytes
//! - `80 b0` - controller address bytes
//! - `id` - random message id (1-255, fresh per send)
//! - `type` - message type code (see below)
//! - `len` - big-endian payload length
//! - `crc` - big-endian CRC-16/Modbus over address..payload
//!
//! Constants are grouped by category. Timing values are the protocol-correct
//! defaults; the client config can override them (tests compress timers).

use std::time::Duration;

// ============================================================================
// Framing
// ============================================================================

/// Magic bytes opening every frame.
pub const HEADER_BYTES: [u8; 2] = [0x55, 0x55];

/// Controller address bytes. Only the first byte is verified on receive.
pub const ADDRESS_BYTES: [u8; 2] = [0x80, 0xb0];

/// Fixed frame overhead: magic (2) + address (2) + id (1) + type (1)
/// + length (2) + checksum (2).
pub const FRAME_OVERHEAD: usize = 10;

/// Header and length prefix consumed before the payload: everything up to
/// and including the big-endian length field.
pub const FRAME_PREFIX_LEN: usize = 8;

// ============================================================================
// Message types
// ============================================================================

/// Group (zone) control command.
pub const MSGTYPE_GRP_CTRL: u8 = 0x2a;

/// Group status query and broadcast response.
pub const MSGTYPE_GRP_STAT: u8 = 0x2b;

/// AC unit control command.
pub const MSGTYPE_AC_CTRL: u8 = 0x2c;

/// AC status query and broadcast response.
pub const MSGTYPE_AC_STAT: u8 = 0x2d;

/// Status queries must carry a non-empty payload; the controller rejects
/// zero-length data (documented firmware quirk). One dummy byte suffices.
pub const STATUS_QUERY_PAYLOAD: [u8; 1] = [0x01];

// ============================================================================
// Keep-unchanged sentinels
// ============================================================================
//
// Unset command fields resolve to these wire values, telling the controller
// to leave the attribute at its current state.

/// AC power field "keep" bits (2-bit field).
pub const AC_POWER_KEEP: u8 = 0b00;

/// AC mode nibble "keep" bits.
pub const AC_MODE_KEEP: u8 = 0b1111;

/// AC fan speed nibble "keep" bits.
pub const AC_FAN_KEEP: u8 = 0b1111;

/// AC setpoint-control field "keep" bits (2-bit field).
pub const AC_TARGET_TYPE_KEEP: u8 = 0b00;

/// AC setpoint value "keep" sentinel (6-bit field).
pub const AC_TARGET_KEEP: u8 = 0b111111;

/// Default AC unit when none is given.
pub const AC_UNIT_DEFAULT: u8 = 0;

/// Group power field "keep" bits.
pub const GROUP_POWER_KEEP: u8 = 0b000;

/// Group control-type field "keep" bits.
pub const GROUP_CONTROL_KEEP: u8 = 0b00;

/// Group target-type field "keep" bits.
pub const GROUP_TARGET_TYPE_KEEP: u8 = 0b000;

/// Default group when none is given.
pub const GROUP_NUMBER_DEFAULT: u8 = 0;

// ============================================================================
// Status record layout
// ============================================================================

/// Bytes per AC unit record in an AC status payload.
pub const AC_STATUS_STRIDE: usize = 8;

/// Bytes per group record in a group status payload.
pub const GROUP_STATUS_STRIDE: usize = 6;

/// Offset subtracted from the raw 11-bit temperature before scaling.
pub const TEMPERATURE_RAW_OFFSET: f32 = 500.0;

// ============================================================================
// Transport and timing
// ============================================================================

/// TCP port the touchpad controller listens on.
pub const DEFAULT_PORT: u16 = 9004;

/// Debounce window for coalescing per-kind status requests.
pub const STATUS_DEBOUNCE: Duration = Duration::from_millis(200);

/// Delay before the group status query after connecting. The controller
/// handles the two status kinds more reliably when staggered.
pub const GROUP_STATUS_STAGGER: Duration = Duration::from_millis(2000);

/// Minimum interval between combined AC+Group polls.
pub const POLL_THROTTLE: Duration = Duration::from_millis(3000);

/// Backoff before a reconnect attempt after a transport error.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(10_000);
