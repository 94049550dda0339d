//! GeoTIFF dataset
//!
//! Reads the first image of a TIFF file and decodes pixel windows from its
//! strips or tiles. Only the chunks that intersect a requested window are
//! read from disk and decompressed.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use log::{debug, info, trace};
use ndarray::Array3;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::coordinate::CoordinateSystemFactory;
use crate::errors::{RasterError, RasterResult};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::raster::{DataType, RasterDataset};
use crate::tiff::constants::{planar_config, predictor, tags};
use crate::tiff::geo_keys::{geotransform_from_tags, GeoKeyDirectory};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// How pixel data is cut into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLayout {
    /// Full-width strips of `rows_per_strip` rows; the last strip may be shorter
    Strips { rows_per_strip: usize },
    /// Fixed-size tiles, padded at the right and bottom edges
    Tiles { width: usize, height: usize },
}

/// A GeoTIFF opened for windowed reading
pub struct GeoTiffDataset<R: SeekableReader = BufReader<File>> {
    reader: R,
    name: String,
    ifd: IFD,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    width: usize,
    height: usize,
    bands: usize,
    data_type: DataType,
    compression: Box<dyn CompressionHandler>,
    predictor: u16,
    planar: u16,
    layout: ChunkLayout,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
    geotransform: [f64; 6],
    epsg: Option<u32>,
    projection: String,
}

fn required_u64(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<u64> {
    tiff.read_tag_u64s(reader, ifd, tag)?
        .first()
        .copied()
        .ok_or(RasterError::TagNotFound(tag))
}

fn optional_f64s(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> RasterResult<Option<Vec<f64>>> {
    if ifd.has_tag(tag) {
        tiff.read_tag_f64s(reader, ifd, tag).map(Some)
    } else {
        Ok(None)
    }
}

impl GeoTiffDataset<BufReader<File>> {
    /// Open a GeoTIFF file
    pub fn open(path: &str) -> RasterResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path)
    }
}

impl<R: SeekableReader> GeoTiffDataset<R> {
    /// Parse the structure of a TIFF held by any seekable reader
    ///
    /// # Arguments
    /// * `reader` - source of the TIFF bytes
    /// * `name` - label used in log messages
    pub fn from_reader(mut reader: R, name: &str) -> RasterResult<Self> {
        let mut tiff = TiffReader::new();
        let ifd = tiff.read(&mut reader)?
            .into_iter()
            .next()
            .ok_or_else(|| RasterError::GenericError("TIFF file contains no image directory".to_string()))?;
        let byte_order = tiff.byte_order().unwrap_or(ByteOrder::LittleEndian);

        let width = required_u64(&tiff, &mut reader, &ifd, tags::IMAGE_WIDTH)? as usize;
        let height = required_u64(&tiff, &mut reader, &ifd, tags::IMAGE_LENGTH)? as usize;
        if width == 0 || height == 0 {
            return Err(RasterError::UnsupportedLayout(format!("image of {}x{} pixels", width, height)));
        }

        let bands = tiff.read_tag_u64_or(&mut reader, &ifd, tags::SAMPLES_PER_PIXEL, 1)? as usize;
        let bits = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            tiff.read_tag_u16s(&mut reader, &ifd, tags::BITS_PER_SAMPLE)?
        } else {
            vec![1]
        };
        let bits_per_sample = bits.first().copied().ok_or(RasterError::TagNotFound(tags::BITS_PER_SAMPLE))?;
        if bits.iter().any(|&b| b != bits_per_sample) {
            return Err(RasterError::UnsupportedLayout(format!("mixed bits per sample {:?}", bits)));
        }
        let format = tiff.read_tag_u64_or(&mut reader, &ifd, tags::SAMPLE_FORMAT, 1)? as u16;
        let data_type = DataType::from_tiff(bits_per_sample, format)?;

        let compression_code = tiff.read_tag_u64_or(&mut reader, &ifd, tags::COMPRESSION, 1)?;
        let compression = CompressionFactory::create_handler(compression_code as u16)?;

        let predictor = tiff.read_tag_u64_or(&mut reader, &ifd, tags::PREDICTOR, predictor::NONE as u64)? as u16;
        match predictor {
            predictor::NONE => {},
            predictor::HORIZONTAL_DIFFERENCING if !data_type.is_float() => {},
            other => {
                return Err(RasterError::UnsupportedLayout(format!("predictor {} for {} samples", other, data_type)));
            },
        }

        let planar = tiff.read_tag_u64_or(&mut reader, &ifd, tags::PLANAR_CONFIGURATION, planar_config::CHUNKY as u64)? as u16;
        if planar != planar_config::CHUNKY && planar != planar_config::PLANAR {
            return Err(RasterError::UnsupportedLayout(format!("planar configuration {}", planar)));
        }

        let (layout, offsets, byte_counts) = if ifd.has_tag(tags::TILE_WIDTH) {
            let tile_width = required_u64(&tiff, &mut reader, &ifd, tags::TILE_WIDTH)? as usize;
            let tile_height = required_u64(&tiff, &mut reader, &ifd, tags::TILE_LENGTH)? as usize;
            if tile_width == 0 || tile_height == 0 {
                return Err(RasterError::UnsupportedLayout("zero-sized tiles".to_string()));
            }
            (
                ChunkLayout::Tiles { width: tile_width, height: tile_height },
                tiff.read_tag_u64s(&mut reader, &ifd, tags::TILE_OFFSETS)?,
                tiff.read_tag_u64s(&mut reader, &ifd, tags::TILE_BYTE_COUNTS)?,
            )
        } else {
            let rows_per_strip = tiff.read_tag_u64_or(&mut reader, &ifd, tags::ROWS_PER_STRIP, height as u64)?
                .clamp(1, height as u64) as usize;
            (
                ChunkLayout::Strips { rows_per_strip },
                tiff.read_tag_u64s(&mut reader, &ifd, tags::STRIP_OFFSETS)?,
                tiff.read_tag_u64s(&mut reader, &ifd, tags::STRIP_BYTE_COUNTS)?,
            )
        };

        let pixel_scale = optional_f64s(&tiff, &mut reader, &ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        let tiepoint = optional_f64s(&tiff, &mut reader, &ifd, tags::MODEL_TIEPOINT_TAG)?;
        let transformation = optional_f64s(&tiff, &mut reader, &ifd, tags::MODEL_TRANSFORMATION_TAG)?;
        let geo_keys = if ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            GeoKeyDirectory::parse(&tiff.read_tag_u16s(&mut reader, &ifd, tags::GEO_KEY_DIRECTORY_TAG)?)?
        } else {
            GeoKeyDirectory::default()
        };
        let geotransform = geotransform_from_tags(
            pixel_scale.as_deref(),
            tiepoint.as_deref(),
            transformation.as_deref(),
            geo_keys.raster_type(),
        )?;
        let epsg = geo_keys.epsg();
        let projection = epsg
            .map(|code| CoordinateSystemFactory::from_epsg(code).to_wkt())
            .unwrap_or_default();

        let dataset = GeoTiffDataset {
            reader,
            name: name.to_string(),
            ifd,
            byte_order,
            is_big_tiff: tiff.is_big_tiff(),
            width,
            height,
            bands,
            data_type,
            compression,
            predictor,
            planar,
            layout,
            offsets,
            byte_counts,
            geotransform,
            epsg,
            projection,
        };

        let expected = dataset.chunk_count();
        if dataset.offsets.len() < expected || dataset.byte_counts.len() < expected {
            return Err(RasterError::UnsupportedLayout(format!(
                "{} chunk offsets and {} byte counts for {} chunks",
                dataset.offsets.len(), dataset.byte_counts.len(), expected)));
        }

        info!("Opened {}: {}x{}x{} {} ({:?}, {} compression)",
              dataset.name, width, height, bands, data_type, layout, dataset.compression.name());
        Ok(dataset)
    }

    /// The image directory the dataset was read from
    pub fn ifd(&self) -> &IFD {
        &self.ifd
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn compression_name(&self) -> &'static str {
        self.compression.name()
    }

    /// EPSG code from the GeoKey directory
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// `(width, height)` of one chunk as stored
    fn chunk_size(&self) -> (usize, usize) {
        match self.layout {
            ChunkLayout::Strips { rows_per_strip } => (self.width, rows_per_strip),
            ChunkLayout::Tiles { width, height } => (width, height),
        }
    }

    /// `(across, down)` chunk counts of one plane
    fn chunk_grid(&self) -> (usize, usize) {
        let (chunk_width, chunk_height) = self.chunk_size();
        (self.width.div_ceil(chunk_width), self.height.div_ceil(chunk_height))
    }

    fn planes(&self) -> usize {
        if self.planar == planar_config::PLANAR { self.bands } else { 1 }
    }

    fn samples_per_chunk_pixel(&self) -> usize {
        if self.planar == planar_config::PLANAR { 1 } else { self.bands }
    }

    fn chunk_count(&self) -> usize {
        let (across, down) = self.chunk_grid();
        across * down * self.planes()
    }

    /// Read, decompress and decode one chunk into samples of `rows` x chunk width
    fn decode_chunk(&mut self, index: usize, rows: usize) -> RasterResult<Vec<f64>> {
        let (chunk_width, _) = self.chunk_size();
        let spp = self.samples_per_chunk_pixel();
        let sample_size = self.data_type.size_in_bytes();
        let row_samples = chunk_width * spp;
        let expected = row_samples * rows * sample_size;

        let mut compressed = vec![0u8; self.byte_counts[index] as usize];
        self.reader.seek(SeekFrom::Start(self.offsets[index]))?;
        self.reader.read_exact(&mut compressed)?;

        let bytes = self.compression.decompress(&compressed)?;
        if bytes.len() < expected {
            return Err(RasterError::GenericError(format!(
                "chunk {} decodes to {} bytes, expected {}", index, bytes.len(), expected)));
        }
        trace!("Chunk {}: {} -> {} bytes", index, compressed.len(), bytes.len());

        let order = self.byte_order;
        let mut raw: Vec<u64> = bytes[..expected].chunks_exact(sample_size).map(|b| match sample_size {
            1 => b[0] as u64,
            2 => order.u16_from(b) as u64,
            4 => order.u32_from(b) as u64,
            _ => order.u64_from(b),
        }).collect();

        if self.predictor == predictor::HORIZONTAL_DIFFERENCING {
            let mask = if sample_size == 8 { u64::MAX } else { (1u64 << (sample_size * 8)) - 1 };
            for row in raw.chunks_exact_mut(row_samples) {
                for i in spp..row_samples {
                    row[i] = row[i].wrapping_add(row[i - spp]) & mask;
                }
            }
        }

        let data_type = self.data_type;
        Ok(raw.into_iter().map(|bits| match data_type {
            DataType::UInt8 => bits as u8 as f64,
            DataType::Int8 => bits as u8 as i8 as f64,
            DataType::UInt16 => bits as u16 as f64,
            DataType::Int16 => bits as u16 as i16 as f64,
            DataType::UInt32 => bits as u32 as f64,
            DataType::Int32 => bits as u32 as i32 as f64,
            DataType::Float32 => f32::from_bits(bits as u32) as f64,
            DataType::Float64 => f64::from_bits(bits),
        }).collect())
    }
}

impl<R: SeekableReader> RasterDataset for GeoTiffDataset<R> {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn band_count(&self) -> usize {
        self.bands
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn geotransform(&self) -> [f64; 6] {
        self.geotransform
    }

    fn projection_wkt(&self) -> String {
        self.projection.clone()
    }

    fn read_window(&mut self, x: usize, y: usize, width: usize, height: usize) -> RasterResult<Array3<f64>> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidWindow(format!("{}x{} window has no pixels", width, height)));
        }
        if x + width > self.width || y + height > self.height {
            return Err(RasterError::InvalidWindow(format!(
                "window {}x{} at ({}, {}) exceeds {}x{} raster", width, height, x, y, self.width, self.height)));
        }

        let (chunk_width, chunk_height) = self.chunk_size();
        let (across, down) = self.chunk_grid();
        let spp = self.samples_per_chunk_pixel();
        let planar = self.planes() > 1;

        let first_col = x / chunk_width;
        let last_col = (x + width - 1) / chunk_width;
        let first_row = y / chunk_height;
        let last_row = (y + height - 1) / chunk_height;

        debug!("Reading window {}x{} at ({}, {}) from chunks {}..={} x {}..={} of {}",
               width, height, x, y, first_col, last_col, first_row, last_row, self.name);

        let mut out = Array3::<f64>::zeros((self.bands, height, width));
        for plane in 0..self.planes() {
            for chunk_row in first_row..=last_row {
                for chunk_col in first_col..=last_col {
                    let index = plane * across * down + chunk_row * across + chunk_col;
                    let origin_x = chunk_col * chunk_width;
                    let origin_y = chunk_row * chunk_height;
                    let rows = match self.layout {
                        ChunkLayout::Strips { .. } => chunk_height.min(self.height - origin_y),
                        ChunkLayout::Tiles { .. } => chunk_height,
                    };

                    let samples = self.decode_chunk(index, rows)?;

                    let row_end = (y + height).min(origin_y + rows);
                    let col_end = (x + width).min(origin_x + chunk_width);
                    for r in y.max(origin_y)..row_end {
                        for c in x.max(origin_x)..col_end {
                            let base = ((r - origin_y) * chunk_width + (c - origin_x)) * spp;
                            for s in 0..spp {
                                let band = if planar { plane } else { s };
                                out[[band, r - y, c - x]] = samples[base + s];
                            }
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}
