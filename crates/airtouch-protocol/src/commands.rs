//! Command payload encoders for AC units and groups.
//!
//! Both command types are sparse: every field is optional and unset fields
//! resolve to the protocol's "keep unchanged" sentinel during packing, so a
//! command only ever touches the attributes it names. Out-of-range numeric
//! inputs are masked to their field width rather than rejected, which is what
//! the controller itself does.

use airtouch_core::constants::{
    AC_FAN_KEEP, AC_MODE_KEEP, AC_POWER_KEEP, AC_TARGET_KEEP, AC_TARGET_TYPE_KEEP,
    AC_UNIT_DEFAULT, GROUP_CONTROL_KEEP, GROUP_NUMBER_DEFAULT, GROUP_POWER_KEEP,
    GROUP_TARGET_TYPE_KEEP,
};
use airtouch_core::{
    AcFanSpeed, AcMode, AcPowerState, AcTargetType, GroupControlType, GroupPowerState,
    GroupTargetType,
};

/// AC unit control configuration.
///
/// Packed into four bytes:
///
/// ```text
/// byte0: power(2) | unit(6)
/// byte1: mode(4)  | fan(4)
/// byte2: target_type(2) | target_value(6)
/// byte3: reserved
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcControl {
    pub unit_number: Option<u8>,
    pub power_state: Option<AcPowerState>,
    pub fan_speed: Option<AcFanSpeed>,
    pub mode: Option<AcMode>,
    pub target_type: Option<AcTargetType>,
    pub target_value: Option<u8>,
}

impl AcControl {
    /// Configuration for an abstract heating/cooling state: 0 turns the unit
    /// off, 1 is heat, 2 is cool, and anything else falls back to auto.
    pub fn heating_cooling_state(unit_number: u8, state: u8) -> Self {
        match state {
            0 => AcControl {
                unit_number: Some(unit_number),
                power_state: Some(AcPowerState::Off),
                ..Default::default()
            },
            1 => AcControl {
                unit_number: Some(unit_number),
                power_state: Some(AcPowerState::On),
                mode: Some(AcMode::Heat),
                ..Default::default()
            },
            2 => AcControl {
                unit_number: Some(unit_number),
                power_state: Some(AcPowerState::On),
                mode: Some(AcMode::Cool),
                ..Default::default()
            },
            _ => AcControl {
                unit_number: Some(unit_number),
                power_state: Some(AcPowerState::On),
                mode: Some(AcMode::Auto),
                ..Default::default()
            },
        }
    }

    /// Configuration changing only the target setpoint (whole degrees).
    pub fn target_temperature(unit_number: u8, celsius: u8) -> Self {
        AcControl {
            unit_number: Some(unit_number),
            target_value: Some(celsius),
            ..Default::default()
        }
    }

    /// Configuration changing only the fan speed.
    pub fn fan_speed(unit_number: u8, speed: AcFanSpeed) -> Self {
        AcControl {
            unit_number: Some(unit_number),
            fan_speed: Some(speed),
            ..Default::default()
        }
    }

    /// Resolve unset fields to keep sentinels and pack into the fixed layout.
    #[must_use]
    pub fn pack(&self) -> [u8; 4] {
        let unit = self.unit_number.unwrap_or(AC_UNIT_DEFAULT) & 0x3f;
        let power = self.power_state.map_or(AC_POWER_KEEP, |p| p as u8);
        let fan = self.fan_speed.map_or(AC_FAN_KEEP, |f| f as u8);
        let mode = self.mode.map_or(AC_MODE_KEEP, |m| m as u8);
        let target = self.target_value.unwrap_or(AC_TARGET_KEEP) & 0x3f;
        let target_type = self.target_type.map_or(AC_TARGET_TYPE_KEEP, |t| t as u8);

        [
            unit | power << 6,
            fan | mode << 4,
            target | target_type << 6,
            0,
        ]
    }
}

/// Group (zone) control configuration.
///
/// Packed into four bytes:
///
/// ```text
/// byte0: group(6)
/// byte1: target_type(3) << 5 | control_type(2) << 3 | power(3)
/// byte2: target
/// byte3: reserved
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupControl {
    pub group_number: Option<u8>,
    pub power_state: Option<GroupPowerState>,
    pub control_type: Option<GroupControlType>,
    pub target_type: Option<GroupTargetType>,
    pub target: Option<u8>,
}

impl GroupControl {
    /// Power the zone on or off.
    pub fn set_active(group_number: u8, active: bool) -> Self {
        GroupControl {
            group_number: Some(group_number),
            power_state: Some(if active {
                GroupPowerState::On
            } else {
                GroupPowerState::Off
            }),
            ..Default::default()
        }
    }

    /// Drive the damper to an open percentage.
    pub fn damper_position(group_number: u8, percent: u8) -> Self {
        GroupControl {
            group_number: Some(group_number),
            target_type: Some(GroupTargetType::Damper),
            target: Some(percent),
            ..Default::default()
        }
    }

    /// Switch the zone between damper and temperature regulation.
    pub fn control_type(group_number: u8, kind: GroupControlType) -> Self {
        GroupControl {
            group_number: Some(group_number),
            control_type: Some(kind),
            ..Default::default()
        }
    }

    /// Set the zone setpoint (whole degrees).
    pub fn target_temperature(group_number: u8, celsius: u8) -> Self {
        GroupControl {
            group_number: Some(group_number),
            target_type: Some(GroupTargetType::Temperature),
            target: Some(celsius),
            ..Default::default()
        }
    }

    /// Resolve unset fields to keep sentinels and pack into the fixed layout.
    #[must_use]
    pub fn pack(&self) -> [u8; 4] {
        let group = self.group_number.unwrap_or(GROUP_NUMBER_DEFAULT) & 0x3f;
        let power = self.power_state.map_or(GROUP_POWER_KEEP, |p| p as u8);
        let control = self.control_type.map_or(GROUP_CONTROL_KEEP, |c| c as u8);
        let target_type = self.target_type.map_or(GROUP_TARGET_TYPE_KEEP, |t| t as u8);
        let target = self.target.unwrap_or(0);

        [group, power | control << 3 | target_type << 5, target, 0]
    }
}
