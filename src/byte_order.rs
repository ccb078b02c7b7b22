//! Helpers for explicit network byte-order conversions.
//!
//! Every multi-byte integer in a frame body travels big-endian. Keeping the
//! conversions here scopes the Clippy expectations to the conversion points
//! so the codec can stay explicit about wire endianness.

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use scorewire::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x1234), [0x12, 0x34]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise a `u32` length or count in network byte order.
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` length or count.
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Serialise a signed 64-bit integer (also used for Unix milliseconds).
///
/// # Examples
///
/// ```
/// use scorewire::byte_order::{read_network_i64, write_network_i64};
///
/// let wire = write_network_i64(-2);
/// assert_eq!(wire, [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
/// assert_eq!(read_network_i64(wire), -2);
/// ```
#[must_use]
pub fn write_network_i64(value: i64) -> [u8; 8] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order signed 64-bit integer.
#[must_use]
pub fn read_network_i64(bytes: [u8; 8]) -> i64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    i64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(0xbeef)]
    #[case(u16::MAX)]
    fn u16_round_trips(#[case] value: u16) {
        assert_eq!(read_network_u16(write_network_u16(value)), value);
    }

    #[test]
    fn u32_is_big_endian() {
        assert_eq!(write_network_u32(0x0102_0304), [1, 2, 3, 4]);
        assert_eq!(read_network_u32([0, 0, 1, 0]), 256);
    }

    #[rstest]
    #[case(i64::MIN)]
    #[case(-1)]
    #[case(0)]
    #[case(1_700_000_000_000)]
    #[case(i64::MAX)]
    fn i64_round_trips(#[case] value: i64) {
        assert_eq!(read_network_i64(write_network_i64(value)), value);
    }
}
