//! CRC-16/Modbus checksum used by the AirTouch wire protocol.
//!
//! Every frame carries a big-endian CRC-16 trailer computed over the address
//! bytes, message id, message type, length field and payload. The controller
//! uses the Modbus variant: initial value 0xFFFF, reflected polynomial 0xA001.

/// Compute the CRC-16/Modbus of a byte sequence.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            let odd = crc & 0x0001 != 0;
            crc >>= 1;
            if odd {
                crc ^= 0xA001;
            }
        }
    }
    crc
}
