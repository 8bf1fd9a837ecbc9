use heapless::Vec;

use crate::PAYLOAD_CAPACITY;

pub type Payload = Vec<u8, PAYLOAD_CAPACITY>;

/// Uplink layout, FPort 1 by default:
///
/// Start | End | Description
///     0 |   1 | Battery level (mV), big endian
pub fn encode_battery(millivolts: u16) -> Payload {
    // Capacity is well above the two bytes written here.
    Payload::from_slice(&millivolts.to_be_bytes()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_is_high_byte_first() {
        assert_eq!(encode_battery(3300).as_slice(), &[0x0C, 0xE4]);
        assert_eq!(encode_battery(0).as_slice(), &[0x00, 0x00]);
        assert_eq!(encode_battery(u16::MAX).as_slice(), &[0xFF, 0xFF]);
    }
}
