//! Command-side enums and shared conversions.
//!
//! These types cover the *write* direction: each variant carries its exact
//! wire bits. "Keep unchanged" is never a variant here — command structs use
//! `Option<T>` and resolve `None` to the sentinel constants at pack time, so
//! sentinel magic numbers stay out of the value domain.
//!
//! Status records report power/mode/fan as the raw protocol codes; mapping
//! them onto user-visible states belongs to the integration layer.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, constants::TEMPERATURE_RAW_OFFSET};

/// AC unit power field (2 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcPowerState {
    /// Cycle to the next power state.
    Next = 0b01,
    Off = 0b10,
    On = 0b11,
}

/// AC operating mode nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcMode {
    Auto = 0b0000,
    Heat = 0b0001,
    Dry = 0b0010,
    Fan = 0b0011,
    Cool = 0b0100,
}

/// AC fan speed nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcFanSpeed {
    Auto = 0b0000,
    Quiet = 0b0001,
    Low = 0b0010,
    Medium = 0b0011,
    High = 0b0100,
    Powerful = 0b0101,
    Turbo = 0b0110,
}

impl AcFanSpeed {
    /// Convert a raw speed code into a fan speed.
    ///
    /// # Errors
    /// Returns `Error::InvalidValue` for codes the controller does not define.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(AcFanSpeed::Auto),
            1 => Ok(AcFanSpeed::Quiet),
            2 => Ok(AcFanSpeed::Low),
            3 => Ok(AcFanSpeed::Medium),
            4 => Ok(AcFanSpeed::High),
            5 => Ok(AcFanSpeed::Powerful),
            6 => Ok(AcFanSpeed::Turbo),
            _ => Err(Error::InvalidValue {
                field: "fan speed",
                value,
            }),
        }
    }
}

/// AC setpoint-control field (2 bits). `0b00` on the wire means keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcTargetType {
    /// Apply the 6-bit setpoint value as a temperature.
    Temperature = 0b01,
}

/// Group power field (3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GroupPowerState {
    Next = 0b001,
    Off = 0b010,
    On = 0b011,
    Turbo = 0b101,
}

/// Group control-type field (2 bits): which quantity the zone regulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GroupControlType {
    Damper = 0b10,
    Temperature = 0b11,
}

impl GroupControlType {
    /// Map the public 0/1 control-type selector onto wire bits.
    ///
    /// # Errors
    /// Returns `Error::InvalidValue` for anything other than 0 (damper)
    /// or 1 (temperature).
    pub fn from_selector(value: u8) -> Result<Self> {
        match value {
            0 => Ok(GroupControlType::Damper),
            1 => Ok(GroupControlType::Temperature),
            _ => Err(Error::InvalidValue {
                field: "control type",
                value,
            }),
        }
    }
}

/// Group target-type field (3 bits): how to interpret the target byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GroupTargetType {
    /// Target is a damper open percentage.
    Damper = 0b100,
    /// Target is a setpoint in whole degrees.
    Temperature = 0b101,
}

/// Convert an 11-bit raw temperature reading to degrees Celsius.
///
/// Shared by AC and group status decoding: `(raw - 500) / 10`, so raw 0 is
/// -50.0 degrees and raw 1000 is 50.0 degrees.
#[must_use]
pub fn raw_to_celsius(raw: u16) -> f32 {
    (f32::from(raw) - TEMPERATURE_RAW_OFFSET) / 10.0
}
