//! GeoTIFF file construction
//!
//! Collects tag values and strip data for a single-image classic TIFF and
//! writes it little-endian: header, IFD, out-of-line tag data, then strips,
//! each block aligned to four bytes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info};

use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::{field_types, header, tags};
use crate::utils::write_utils;

/// Values of one tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Double(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    fn field_type(&self) -> u16 {
        match self {
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ascii(_) => field_types::ASCII,
        }
    }

    fn count(&self) -> u32 {
        match self {
            TagValue::Short(v) => v.len() as u32,
            TagValue::Long(v) => v.len() as u32,
            TagValue::Double(v) => v.len() as u32,
            // NUL terminator
            TagValue::Ascii(s) => s.len() as u32 + 1,
        }
    }

    fn to_bytes(&self) -> RasterResult<Vec<u8>> {
        let mut bytes = Vec::new();
        match self {
            TagValue::Short(values) => for &v in values { bytes.write_u16::<LittleEndian>(v)?; },
            TagValue::Long(values) => for &v in values { bytes.write_u32::<LittleEndian>(v)?; },
            TagValue::Double(values) => for &v in values { bytes.write_f64::<LittleEndian>(v)?; },
            TagValue::Ascii(s) => {
                bytes.extend_from_slice(s.as_bytes());
                bytes.push(0);
            },
        }
        Ok(bytes)
    }
}

/// Builder for a single-image, strip-organised GeoTIFF
#[derive(Debug, Default)]
pub struct GeoTiffBuilder {
    tags: BTreeMap<u16, TagValue>,
    strips: Vec<Vec<u8>>,
}

impl GeoTiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_short(&mut self, tag: u16, values: Vec<u16>) -> &mut Self {
        self.tags.insert(tag, TagValue::Short(values));
        self
    }

    pub fn set_long(&mut self, tag: u16, values: Vec<u32>) -> &mut Self {
        self.tags.insert(tag, TagValue::Long(values));
        self
    }

    pub fn set_double(&mut self, tag: u16, values: Vec<f64>) -> &mut Self {
        self.tags.insert(tag, TagValue::Double(values));
        self
    }

    pub fn set_ascii(&mut self, tag: u16, value: &str) -> &mut Self {
        self.tags.insert(tag, TagValue::Ascii(value.to_string()));
        self
    }

    /// Append one (already compressed) strip
    pub fn add_strip(&mut self, data: Vec<u8>) -> &mut Self {
        self.strips.push(data);
        self
    }

    pub fn tag(&self, tag: u16) -> Option<&TagValue> {
        self.tags.get(&tag)
    }

    /// Write the file to `path`
    pub fn write(&mut self, path: &str) -> RasterResult<()> {
        info!("Writing GeoTIFF to {}", path);
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialise the file into any writer
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> RasterResult<()> {
        let byte_counts: Vec<u32> = self.strips.iter().map(|s| s.len() as u32).collect();
        self.set_long(tags::STRIP_BYTE_COUNTS, byte_counts);
        // Placeholder of the final size so the layout below stays valid
        self.set_long(tags::STRIP_OFFSETS, vec![0; self.strips.len()]);

        let ifd_offset: u64 = 8;
        let ifd_size = 2 + 12 * self.tags.len() as u64 + 4;

        let mut external: Vec<(u16, u64)> = Vec::new();
        let mut offset = write_utils::align_to_4_bytes(ifd_offset + ifd_size);
        for (&tag, value) in &self.tags {
            let len = value.to_bytes()?.len() as u64;
            if len > 4 {
                external.push((tag, offset));
                offset = write_utils::align_to_4_bytes(offset + len);
            }
        }

        let mut strip_offsets = Vec::with_capacity(self.strips.len());
        for strip in &self.strips {
            strip_offsets.push(u32::try_from(offset).map_err(|_| RasterError::GenericError(
                "raster exceeds the 4 GiB limit of classic TIFF".to_string()))?);
            offset = write_utils::align_to_4_bytes(offset + strip.len() as u64);
        }
        u32::try_from(offset).map_err(|_| RasterError::GenericError(
            "raster exceeds the 4 GiB limit of classic TIFF".to_string()))?;
        self.set_long(tags::STRIP_OFFSETS, strip_offsets);

        debug!("Layout: {} tags, {} out-of-line, {} strips, {} bytes", self.tags.len(), external.len(), self.strips.len(), offset);

        // Header
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;
        writer.write_u16::<LittleEndian>(header::TIFF_VERSION)?;
        writer.write_u32::<LittleEndian>(ifd_offset as u32)?;

        // IFD
        writer.write_u16::<LittleEndian>(self.tags.len() as u16)?;
        for (&tag, value) in &self.tags {
            writer.write_u16::<LittleEndian>(tag)?;
            writer.write_u16::<LittleEndian>(value.field_type())?;
            writer.write_u32::<LittleEndian>(value.count())?;

            match external.iter().find(|(t, _)| *t == tag) {
                Some(&(_, data_offset)) => writer.write_u32::<LittleEndian>(data_offset as u32)?,
                None => {
                    let mut inline = value.to_bytes()?;
                    inline.resize(4, 0);
                    writer.write_all(&inline)?;
                },
            }
        }
        writer.write_u32::<LittleEndian>(0)?;
        write_utils::write_padding(writer, (ifd_offset + ifd_size) as usize)?;

        // Out-of-line tag data, in the same order the offsets were assigned
        for (tag, _) in &external {
            if let Some(value) = self.tags.get(tag) {
                let bytes = value.to_bytes()?;
                writer.write_all(&bytes)?;
                write_utils::write_padding(writer, bytes.len())?;
            }
        }

        for strip in &self.strips {
            writer.write_all(strip)?;
            write_utils::write_padding(writer, strip.len())?;
        }

        Ok(())
    }
}
