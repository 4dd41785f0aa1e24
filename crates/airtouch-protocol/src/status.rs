//! Status payload decoders.
//!
//! The controller broadcasts AC status as 8-byte records (one per unit) and
//! group status as 6-byte records (one per zone). Decoding walks the payload
//! in fixed strides; trailing bytes short of a full record are ignored rather
//! than treated as an error.
//!
//! Power, mode and fan fields are reported as the raw protocol codes. The
//! integration layer owns their mapping onto user-visible states.

use serde::{Deserialize, Serialize};

use airtouch_core::constants::{AC_STATUS_STRIDE, GROUP_STATUS_STRIDE};
use airtouch_core::raw_to_celsius;

/// Decoded state of one AC unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcStatusRecord {
    pub unit_number: u8,
    /// Raw power code (2 bits).
    pub power_state: u8,
    /// Raw mode code (4 bits).
    pub mode: u8,
    /// Raw fan speed code (4 bits).
    pub fan_speed: u8,
    /// Unit is in spill/bypass airflow mode.
    pub spill: bool,
    /// A timer is programmed on the unit.
    pub timer_set: bool,
    /// Target setpoint in whole degrees.
    pub target: f32,
    /// Current temperature in degrees Celsius.
    pub temperature: f32,
    pub error_code: u16,
}

/// Decoded state of one group (zone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatusRecord {
    pub group_number: u8,
    /// Raw power code (2 bits).
    pub power_state: u8,
    /// Regulation kind: 0 damper, 1 temperature.
    pub control_type: u8,
    /// Damper open percentage (0-100).
    pub damper_position: u8,
    pub battery_low: bool,
    pub has_turbo: bool,
    /// Target setpoint in whole degrees.
    pub target: f32,
    /// Zone has its own temperature sensor; `temperature` is only meaningful
    /// when set.
    pub has_sensor: bool,
    /// Current temperature in degrees Celsius.
    pub temperature: f32,
    pub has_spill: bool,
}

/// Reassemble the 11-bit temperature reading spread across two bytes.
fn temperature_bits(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 3) | u16::from(lo >> 5)
}

/// Decode an AC status payload into unit records (stride 8, remainder
/// ignored).
#[must_use]
pub fn decode_ac_status(payload: &[u8]) -> Vec<AcStatusRecord> {
    payload
        .chunks_exact(AC_STATUS_STRIDE)
        .map(|unit| AcStatusRecord {
            unit_number: unit[0] & 0b0011_1111,
            power_state: (unit[0] & 0b1100_0000) >> 6,
            mode: (unit[1] & 0b1111_0000) >> 4,
            fan_speed: unit[1] & 0b0000_1111,
            spill: unit[2] & 0b1000_0000 != 0,
            timer_set: unit[2] & 0b0100_0000 != 0,
            target: f32::from(unit[2] & 0b0011_1111),
            temperature: raw_to_celsius(temperature_bits(unit[4], unit[5])),
            error_code: u16::from_be_bytes([unit[6], unit[7]]),
        })
        .collect()
}

/// Decode a group status payload into zone records (stride 6, remainder
/// ignored).
#[must_use]
pub fn decode_group_status(payload: &[u8]) -> Vec<GroupStatusRecord> {
    payload
        .chunks_exact(GROUP_STATUS_STRIDE)
        .map(|group| GroupStatusRecord {
            group_number: group[0] & 0b0011_1111,
            power_state: (group[0] & 0b1100_0000) >> 6,
            control_type: (group[1] & 0b1000_0000) >> 7,
            damper_position: group[1] & 0b0111_1111,
            battery_low: group[2] & 0b1000_0000 != 0,
            has_turbo: group[2] & 0b0100_0000 != 0,
            target: f32::from(group[2] & 0b0011_1111),
            has_sensor: group[3] & 0b1000_0000 != 0,
            temperature: raw_to_celsius(temperature_bits(group[4], group[5])),
            has_spill: group[5] & 0b0001_0000 != 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Build one AC record with a given raw 11-bit temperature.
    fn ac_record_bytes(unit: u8, raw_temp: u16) -> [u8; 8] {
        [
            unit,
            0x00,
            0x00,
            0x00,
            (raw_temp >> 3) as u8,
            ((raw_temp & 0b111) as u8) << 5,
            0x00,
            0x00,
        ]
    }

    #[test]
    fn decodes_full_ac_record() {
        let payload = [
            0b1100_0011,          // power 3, unit 3
            0b0100_0010,          // mode 4 (cool), fan 2 (low)
            0b1101_1000,          // spill, timer, target 24
            0x00,                 // reserved
            0b0101_1111, 0b0110_0000, // raw temp 763 -> 26.3 C
            0x01, 0x2c,           // error code 300
        ];
        let records = decode_ac_status(&payload);
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.unit_number, 3);
        assert_eq!(r.power_state, 3);
        assert_eq!(r.mode, 4);
        assert_eq!(r.fan_speed, 2);
        assert!(r.spill);
        assert!(r.timer_set);
        assert!((r.target - 24.0).abs() < f32::EPSILON);
        assert!((r.temperature - 26.3).abs() < 0.001);
        assert_eq!(r.error_code, 300);
    }

    #[rstest]
    #[case(0, -50.0)]
    #[case(500, 0.0)]
    #[case(1000, 50.0)]
    fn ac_temperature_anchors(#[case] raw: u16, #[case] celsius: f32) {
        let records = decode_ac_status(&ac_record_bytes(0, raw));
        assert!((records[0].temperature - celsius).abs() < 0.001);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(7, 0)]
    #[case(8, 1)]
    #[case(20, 2)]
    #[case(24, 3)]
    fn ac_stride_truncation(#[case] len: usize, #[case] records: usize) {
        let payload = vec![0u8; len];
        assert_eq!(decode_ac_status(&payload).len(), records);
    }

    #[test]
    fn decodes_full_group_record() {
        let payload = [
            0b0100_0101,          // power 1, group 5
            0b1011_0010,          // temperature control, damper 50%
            0b1101_0110,          // battery low, turbo, target 22
            0b1000_0000,          // has sensor
            0b0101_1101, 0b1011_0000, // raw temp 749 -> 24.9 C; spill bit set
        ];
        let records = decode_group_status(&payload);
        assert_eq!(records.len(), 1);

        let g = &records[0];
        assert_eq!(g.group_number, 5);
        assert_eq!(g.power_state, 1);
        assert_eq!(g.control_type, 1);
        assert_eq!(g.damper_position, 50);
        assert!(g.battery_low);
        assert!(g.has_turbo);
        assert!((g.target - 22.0).abs() < f32::EPSILON);
        assert!(g.has_sensor);
        assert!((g.temperature - 24.9).abs() < 0.001);
        assert!(g.has_spill);
    }

    #[rstest]
    #[case(0, -50.0)]
    #[case(500, 0.0)]
    #[case(1000, 50.0)]
    fn group_temperature_anchors(#[case] raw: u16, #[case] celsius: f32) {
        let payload = [
            0x00,
            0x00,
            0x00,
            0x00,
            (raw >> 3) as u8,
            ((raw & 0b111) as u8) << 5,
        ];
        let records = decode_group_status(&payload);
        assert!((records[0].temperature - celsius).abs() < 0.001);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(5, 0)]
    #[case(6, 1)]
    #[case(13, 2)]
    #[case(18, 3)]
    fn group_stride_truncation(#[case] len: usize, #[case] records: usize) {
        let payload = vec![0u8; len];
        assert_eq!(decode_group_status(&payload).len(), records);
    }

    #[test]
    fn multiple_units_decode_in_order() {
        let mut payload = Vec::new();
        for unit in 0..4u8 {
            payload.extend_from_slice(&ac_record_bytes(unit, 500));
        }
        let records = decode_ac_status(&payload);
        let numbers: Vec<u8> = records.iter().map(|r| r.unit_number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
    }
}
