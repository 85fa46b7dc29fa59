//! Little-endian integer <-> byte conversions, matching the SSZ `uintN` encoding used all over
//! the consensus spec (seeds, shuffling round seeds, domain separation tags).

use bytes::{BufMut, BytesMut};

pub fn int_to_bytes4(int: u32) -> Vec<u8> {
    let mut bytes = BytesMut::with_capacity(4);
    bytes.put_u32_le(int);
    bytes.to_vec()
}

pub fn int_to_bytes8(int: u64) -> Vec<u8> {
    let mut bytes = BytesMut::with_capacity(8);
    bytes.put_u64_le(int);
    bytes.to_vec()
}

pub fn int_to_bytes32(int: u64) -> Vec<u8> {
    let mut bytes = BytesMut::with_capacity(32);
    bytes.put_u64_le(int);
    bytes.put_bytes(0, 24);
    bytes.to_vec()
}

pub fn int_to_fixed_bytes32(int: u64) -> [u8; 32] {
    let mut bytes = [0; 32];
    let int_bytes = int_to_bytes8(int);
    bytes[0..8].copy_from_slice(&int_bytes);
    bytes
}

pub fn bytes_to_int4(bytes: &[u8]) -> u32 {
    let mut array = [0; 4];
    array.copy_from_slice(&bytes[0..4]);
    u32::from_le_bytes(array)
}

pub fn bytes_to_int8(bytes: &[u8]) -> u64 {
    let mut array = [0; 8];
    array.copy_from_slice(&bytes[0..8]);
    u64::from_le_bytes(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        assert_eq!(bytes_to_int4(&int_to_bytes4(42)), 42);
        assert_eq!(bytes_to_int8(&int_to_bytes8(42)), 42);
    }

    #[test]
    fn fixed_32_is_zero_padded() {
        let bytes = int_to_fixed_bytes32(1);
        assert_eq!(bytes[0], 1);
        assert!(bytes[1..].iter().all(|b| *b == 0));
    }
}
