//! Writing utilities
//!
//! Alignment helpers for laying out TIFF blocks on word boundaries.

use std::io::Write;

use crate::errors::RasterResult;

/// Next 4-byte aligned position at or after `offset`
pub fn align_to_4_bytes(offset: u64) -> u64 {
    let remainder = offset % 4;
    if remainder == 0 {
        offset
    } else {
        offset + (4 - remainder)
    }
}

/// Zero bytes needed after `data_len` bytes to reach a 4-byte boundary
pub fn calculate_padding(data_len: usize) -> usize {
    (4 - (data_len % 4)) % 4
}

/// Pad a block of `data_len` bytes out to a 4-byte boundary
pub fn write_padding<W: Write + ?Sized>(writer: &mut W, data_len: usize) -> RasterResult<()> {
    let padding = calculate_padding(data_len);
    if padding > 0 {
        writer.write_all(&[0u8; 3][..padding])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        assert_eq!(align_to_4_bytes(0), 0);
        assert_eq!(align_to_4_bytes(74), 76);
        assert_eq!(align_to_4_bytes(76), 76);
        assert_eq!(calculate_padding(5), 3);
    }

    #[test]
    fn test_padding_written() {
        let mut out = Vec::new();
        write_padding(&mut out, 6).unwrap();
        assert_eq!(out, vec![0, 0]);
    }
}
