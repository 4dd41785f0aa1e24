pub mod checksum;
pub mod codec;
pub mod commands;
pub mod frame;
pub mod status;

pub use checksum::crc16;
pub use codec::AirtouchCodec;
pub use commands::{AcControl, GroupControl};
pub use frame::Frame;
pub use status::{AcStatusRecord, GroupStatusRecord, decode_ac_status, decode_group_status};
