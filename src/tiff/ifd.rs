//! Image File Directory (IFD) structures
//!
//! An IFD is the list of tag entries describing one image of a TIFF file.
//! Entries keep the raw bytes of their value field, so values that fit
//! inline can be decoded with the file's byte order without another read.

use std::collections::HashMap;
use std::fmt;

use log::trace;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::field_types;

/// An Image File Directory
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in file order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    tag_map: HashMap<u16, usize>,
}

/// One tag entry of an IFD
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// The value field decoded as an offset
    pub value_offset: u64,
    /// Raw value field: 4 bytes for classic TIFF, 8 for BigTIFF
    pub value_bytes: Vec<u8>,
}

impl IFDEntry {
    /// Build an entry from its raw value field
    pub fn new(tag: u16, field_type: u16, count: u64, value_bytes: Vec<u8>, byte_order: ByteOrder) -> Self {
        let value_offset = match value_bytes.len() {
            8 => byte_order.u64_from(&value_bytes),
            _ => byte_order.u32_from(&value_bytes) as u64,
        };

        IFDEntry { tag, field_type, count, value_offset, value_bytes }
    }

    /// Size in bytes of a single value
    pub fn field_type_size(&self) -> usize {
        field_types::size_of(self.field_type)
    }

    /// Total size in bytes of all values
    pub fn byte_len(&self) -> usize {
        self.field_type_size() * self.count as usize
    }

    /// Whether the values fit in the value field itself
    pub fn is_value_inline(&self) -> bool {
        self.byte_len() <= self.value_bytes.len()
    }
}

impl IFD {
    pub fn new(number: usize, offset: u64) -> Self {
        IFD {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Add an entry; a repeated tag replaces the lookup of the earlier one
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("IFD #{}: tag {} type {} count {}", self.number, entry.tag, entry.field_type, entry.count);
        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
    }

    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;
        for entry in &self.entries {
            let layout = if entry.is_value_inline() { "inline" } else { "offset" };
            writeln!(f, "    {}: type {}, count {}, {} {}",
                     entry.tag, entry.field_type, entry.count, layout, entry.value_offset)?;
        }
        Ok(())
    }
}
