//! # CRC8-DVB-S2
//!
//! Frame checksum for the actuator link.
//!
//! **Polynomial**: 0xD5, **Initial Value**: 0x00, no reflection.

const CRC8_POLY: u8 = 0xD5;

const CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }

    table
}

/// Checksum over `len | type | payload`
///
/// # Examples
///
/// ```
/// use animatronic_bridge::link::crc::crc8_dvb_s2;
///
/// assert_eq!(crc8_dvb_s2(&[]), 0x00);
/// assert_eq!(crc8_dvb_s2(b"123456789"), 0xBC);
/// ```
#[must_use]
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bitwise reference implementation
    fn crc8_bitwise(data: &[u8]) -> u8 {
        let mut crc: u8 = 0;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ CRC8_POLY
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    #[test]
    fn test_check_value() {
        // Standard CRC-8/DVB-S2 check value
        assert_eq!(crc8_dvb_s2(b"123456789"), 0xBC);
    }

    #[test]
    fn test_table_matches_bitwise() {
        for byte in 0..=255u8 {
            assert_eq!(crc8_dvb_s2(&[byte]), crc8_bitwise(&[byte]));
        }

        let frame = [0x05, 0x21, 0x00, 0x23, 0x28];
        assert_eq!(crc8_dvb_s2(&frame), crc8_bitwise(&frame));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let data = [0x04, 0x22, 0x06, 0x00];
        let crc = crc8_dvb_s2(&data);

        let mut corrupted = data;
        corrupted[3] ^= 0x01;
        assert_ne!(crc8_dvb_s2(&corrupted), crc);
    }
}
