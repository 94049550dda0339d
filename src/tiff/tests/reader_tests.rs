//! Tests for the TIFF structure reader

use std::io::Cursor;

use super::test_utils::{bigtiff_fixture, first_ifd_offset, TiffFixture, Value};
use crate::errors::RasterError;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::tags;
use crate::tiff::reader::TiffReader;

fn dimensions_fixture(byte_order: ByteOrder) -> TiffFixture {
    TiffFixture::new(byte_order)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![800]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![600]))
}

#[test]
fn test_read_classic_tiff() {
    let mut cursor = dimensions_fixture(ByteOrder::LittleEndian).cursor();
    let mut reader = TiffReader::new();

    let ifds = reader.read(&mut cursor).unwrap();
    assert_eq!(ifds.len(), 1);
    assert!(!reader.is_big_tiff());
    assert_eq!(reader.byte_order(), Some(ByteOrder::LittleEndian));
    assert_eq!(ifds[0].entry_count(), 2);
    assert_eq!(reader.read_tag_u64s(&mut cursor, &ifds[0], tags::IMAGE_WIDTH).unwrap(), vec![800]);
    assert_eq!(reader.read_tag_u64_or(&mut cursor, &ifds[0], tags::IMAGE_LENGTH, 0).unwrap(), 600);
}

#[test]
fn test_read_bigtiff() {
    let mut cursor = bigtiff_fixture();
    let mut reader = TiffReader::new();

    let ifds = reader.read(&mut cursor).unwrap();
    assert!(reader.is_big_tiff());
    assert_eq!(reader.read_tag_u64s(&mut cursor, &ifds[0], tags::STRIP_OFFSETS).unwrap(), vec![16]);
    assert_eq!(reader.read_tag_u16s(&mut cursor, &ifds[0], tags::BITS_PER_SAMPLE).unwrap(), vec![8]);
}

#[test]
fn test_big_endian_inline_and_offset_values() {
    let mut cursor = dimensions_fixture(ByteOrder::BigEndian)
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![8, 16]))
        .tag(tags::SAMPLES_PER_PIXEL, Value::Short(vec![2]))
        .tag(tags::MODEL_PIXEL_SCALE_TAG, Value::Double(vec![30.0, 15.0, 0.0]))
        .cursor();
    let mut reader = TiffReader::new();

    let ifds = reader.read(&mut cursor).unwrap();
    let ifd = &ifds[0];
    assert_eq!(reader.byte_order(), Some(ByteOrder::BigEndian));
    assert_eq!(reader.read_tag_u16s(&mut cursor, ifd, tags::BITS_PER_SAMPLE).unwrap(), vec![8, 16]);
    assert_eq!(reader.read_tag_u64_or(&mut cursor, ifd, tags::SAMPLES_PER_PIXEL, 1).unwrap(), 2);
    assert_eq!(reader.read_tag_f64s(&mut cursor, ifd, tags::MODEL_PIXEL_SCALE_TAG).unwrap(), vec![30.0, 15.0, 0.0]);
    assert_eq!(reader.read_tag_u64_or(&mut cursor, ifd, tags::COMPRESSION, 1).unwrap(), 1);
}

#[test]
fn test_missing_tag_and_wrong_type() {
    let mut cursor = dimensions_fixture(ByteOrder::LittleEndian)
        .tag(tags::MODEL_PIXEL_SCALE_TAG, Value::Double(vec![1.0, 1.0, 0.0]))
        .cursor();
    let mut reader = TiffReader::new();
    let ifds = reader.read(&mut cursor).unwrap();

    assert!(matches!(reader.read_tag_u64s(&mut cursor, &ifds[0], tags::TILE_WIDTH),
                     Err(RasterError::TagNotFound(322))));
    assert!(matches!(reader.read_tag_u64s(&mut cursor, &ifds[0], tags::MODEL_PIXEL_SCALE_TAG),
                     Err(RasterError::UnsupportedLayout(_))));
}

#[test]
fn test_invalid_header() {
    let mut cursor = Cursor::new(vec![0x49, 0x49, 41, 0, 8, 0, 0, 0]);
    assert!(matches!(TiffReader::new().read(&mut cursor), Err(RasterError::InvalidHeader)));

    let mut cursor = Cursor::new(vec![0x12, 0x34, 42, 0, 8, 0, 0, 0]);
    assert!(matches!(TiffReader::new().read(&mut cursor), Err(RasterError::InvalidByteOrder(_))));
}

#[test]
fn test_ifd_loop_is_cut() {
    let mut bytes = dimensions_fixture(ByteOrder::LittleEndian).build();
    let ifd_offset = first_ifd_offset(&bytes);
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&ifd_offset.to_le_bytes());

    let ifds = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(ifds.len(), 1);
}
