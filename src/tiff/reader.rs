//! TIFF file reader
//!
//! Parses the header and IFD chain of classic TIFF and BigTIFF files and
//! decodes tag values, using the byte order handler picked from the header.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::ifd::{IFDEntry, IFD};

/// Upper bound on the IFD chain length, guarding against offset loops
const MAX_IFDS: usize = 1024;

/// Reader for TIFF and BigTIFF structure
pub struct TiffReader {
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    fn handler(&self) -> RasterResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| RasterError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Byte order of the file, once the header has been read
    pub fn byte_order(&self) -> Option<ByteOrder> {
        self.byte_order_handler.as_ref().map(|handler| handler.byte_order())
    }

    /// Whether the file read is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Read the header and every IFD of the chain
    ///
    /// # Returns
    /// The IFDs in file order; the first is the full-resolution image
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> RasterResult<Vec<IFD>> {
        reader.seek(SeekFrom::Start(0))?;
        let byte_order = ByteOrder::detect(reader)?;
        let handler = byte_order.create_handler();

        let version = handler.read_u16(reader)?;
        let first_ifd_offset = match version {
            header::TIFF_VERSION => {
                self.is_big_tiff = false;
                handler.read_u32(reader)? as u64
            },
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let _reserved = handler.read_u16(reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE {
                    return Err(RasterError::InvalidHeader);
                }
                self.is_big_tiff = true;
                handler.read_u64(reader)?
            },
            _ => return Err(RasterError::InvalidHeader),
        };

        debug!("{} {}, first IFD at {}", byte_order.name(),
               if self.is_big_tiff { "BigTIFF" } else { "TIFF" }, first_ifd_offset);
        self.byte_order_handler = Some(handler);

        let file_size = reader.seek(SeekFrom::End(0))?;
        let ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;
        if ifds.is_empty() {
            return Err(RasterError::GenericError("TIFF file contains no image directory".to_string()));
        }

        info!("Read {} IFD(s)", ifds.len());
        Ok(ifds)
    }

    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_offset: u64, file_size: u64) -> RasterResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = first_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            if offset < 8 || offset >= file_size {
                warn!("IFD offset {} outside file of {} bytes, stopping IFD chain", offset, file_size);
                break;
            }
            if !visited.insert(offset) {
                warn!("IFD offset {} already visited, stopping IFD chain", offset);
                break;
            }

            let (ifd, next) = self.read_ifd(reader, offset, ifds.len())?;
            ifds.push(ifd);
            offset = next;
        }

        Ok(ifds)
    }

    /// Read one IFD and the offset of the next
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> RasterResult<(IFD, u64)> {
        let handler = self.handler()?;
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };

        let mut ifd = IFD::new(number, offset);
        let value_size = if self.is_big_tiff { 8 } else { 4 };
        for _ in 0..entry_count {
            let tag = handler.read_u16(reader)?;
            let field_type = handler.read_u16(reader)?;
            let count = if self.is_big_tiff {
                handler.read_u64(reader)?
            } else {
                handler.read_u32(reader)? as u64
            };
            let mut value_bytes = vec![0u8; value_size];
            reader.read_exact(&mut value_bytes)?;

            ifd.add_entry(IFDEntry::new(tag, field_type, count, value_bytes, handler.byte_order()));
        }

        let next = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        debug!("IFD #{} at {}: {} entries, next at {}", number, offset, entry_count, next);
        Ok((ifd, next))
    }

    /// Raw bytes of a tag's values
    pub fn read_tag_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> RasterResult<Vec<u8>> {
        let len = entry.byte_len();
        if entry.is_value_inline() {
            return Ok(entry.value_bytes[..len].to_vec());
        }

        let mut bytes = vec![0u8; len];
        reader.seek(SeekFrom::Start(entry.value_offset))?;
        reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Integer tag values widened to u64
    ///
    /// Signed types are reinterpreted from their two's complement bits.
    pub fn read_tag_u64s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(RasterError::TagNotFound(tag))?;
        match entry.field_type {
            field_types::BYTE | field_types::UNDEFINED | field_types::SBYTE | field_types::SHORT
            | field_types::SSHORT | field_types::LONG | field_types::SLONG | field_types::LONG8
            | field_types::SLONG8 | field_types::IFD8 => {},
            other => return Err(RasterError::UnsupportedLayout(
                format!("tag {} has non-integer field type {}", tag, other))),
        }

        let bytes = self.read_tag_bytes(reader, entry)?;
        let order = self.byte_order().unwrap_or(ByteOrder::LittleEndian);

        Ok(bytes.chunks_exact(entry.field_type_size()).map(|chunk| match entry.field_type {
            field_types::BYTE | field_types::UNDEFINED => chunk[0] as u64,
            field_types::SBYTE => chunk[0] as i8 as i64 as u64,
            field_types::SHORT => order.u16_from(chunk) as u64,
            field_types::SSHORT => order.u16_from(chunk) as i16 as i64 as u64,
            field_types::LONG => order.u32_from(chunk) as u64,
            field_types::SLONG => order.u32_from(chunk) as i32 as i64 as u64,
            _ => order.u64_from(chunk),
        }).collect())
    }

    /// Integer tag values narrowed to u16
    pub fn read_tag_u16s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<Vec<u16>> {
        Ok(self.read_tag_u64s(reader, ifd, tag)?.into_iter().map(|v| v as u16).collect())
    }

    /// First value of an integer tag, or `default` when the tag is absent
    pub fn read_tag_u64_or(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16, default: u64) -> RasterResult<u64> {
        if !ifd.has_tag(tag) {
            return Ok(default);
        }
        self.read_tag_u64s(reader, ifd, tag)?
            .first()
            .copied()
            .ok_or(RasterError::TagNotFound(tag))
    }

    /// Numeric tag values as f64
    pub fn read_tag_f64s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(RasterError::TagNotFound(tag))?;
        let order = self.byte_order().unwrap_or(ByteOrder::LittleEndian);

        match entry.field_type {
            field_types::DOUBLE => {
                let bytes = self.read_tag_bytes(reader, entry)?;
                Ok(bytes.chunks_exact(8).map(|c| f64::from_bits(order.u64_from(c))).collect())
            },
            field_types::FLOAT => {
                let bytes = self.read_tag_bytes(reader, entry)?;
                Ok(bytes.chunks_exact(4).map(|c| f32::from_bits(order.u32_from(c)) as f64).collect())
            },
            field_types::RATIONAL | field_types::SRATIONAL => {
                let bytes = self.read_tag_bytes(reader, entry)?;
                let signed = entry.field_type == field_types::SRATIONAL;
                Ok(bytes.chunks_exact(8).map(|c| {
                    let (num, den) = (order.u32_from(&c[..4]), order.u32_from(&c[4..]));
                    if signed {
                        num as i32 as f64 / den as i32 as f64
                    } else {
                        num as f64 / den as f64
                    }
                }).collect())
            },
            field_types::SBYTE | field_types::SSHORT | field_types::SLONG | field_types::SLONG8 => {
                Ok(self.read_tag_u64s(reader, ifd, tag)?.into_iter().map(|v| v as i64 as f64).collect())
            },
            _ => Ok(self.read_tag_u64s(reader, ifd, tag)?.into_iter().map(|v| v as f64).collect()),
        }
    }

    /// ASCII tag value without trailing NULs
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<String> {
        let entry = ifd.get_entry(tag).ok_or(RasterError::TagNotFound(tag))?;
        let mut bytes = self.read_tag_bytes(reader, entry)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| RasterError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }
}
