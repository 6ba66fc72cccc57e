//! DDS header inspection.

use std::fs;
use std::path::Path;

use ozd_common::BinaryReader;

use crate::header::{
    block_size, max_mip_levels, mipmap_size, DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC,
};
use crate::{Error, Result, DDS_MAGIC};

/// Summary of a DDS file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsSummary {
    /// Total size of the inspected data in bytes.
    pub file_size: usize,
    /// Declared header size (124 for well-formed files).
    pub header_size: u32,
    /// Header flags.
    pub flags: u32,
    pub width: u32,
    pub height: u32,
    pub pitch_or_linear_size: u32,
    pub mipmap_count: u32,
    /// Pixel format flags.
    pub pixel_flags: u32,
    pub four_cc: FourCC,
    pub rgb_bit_count: u32,
    /// DXGI format from the DX10 extension, if present.
    pub dxgi_format: Option<u32>,
    /// Bytes following the header(s).
    pub payload_size: usize,
}

impl DdsSummary {
    /// Human readable format: the FourCC, the DXGI format, or the RGB bit depth.
    pub fn format_label(&self) -> String {
        match self.dxgi_format {
            Some(dxgi) => format!("DX10 (DXGI {})", dxgi),
            None if self.pixel_flags & DdsPixelFormat::FLAG_FOURCC != 0 => self.four_cc.to_string(),
            None => format!("{}bit RGB", self.rgb_bit_count),
        }
    }

    /// Number of payload bytes the header implies, when it can be computed.
    ///
    /// Only covers single-surface block-compressed and RGB textures. Cubemaps
    /// and volume textures report more data than this. Levels past the end of
    /// a full mip chain are ignored, and sizes that overflow give `None`.
    pub fn expected_payload_size(&self) -> Option<usize> {
        let levels = self
            .mipmap_count
            .clamp(1, max_mip_levels(self.width, self.height));
        let per_level: Box<dyn Fn(u32, u32) -> Option<usize>> =
            if self.pixel_flags & DdsPixelFormat::FLAG_FOURCC != 0 {
                let blk = block_size(self.four_cc, self.dxgi_format)?;
                Box::new(move |w: u32, h: u32| mipmap_size(w, h, blk))
            } else if self.pixel_flags & DdsPixelFormat::FLAG_RGB != 0 && self.rgb_bit_count > 0 {
                let bits = self.rgb_bit_count as usize;
                Box::new(move |w: u32, h: u32| {
                    (w as usize)
                        .checked_mul(bits)?
                        .div_ceil(8)
                        .checked_mul(h as usize)
                })
            } else {
                return None;
            };

        (0..levels).try_fold(0usize, |total, i| {
            let w = (self.width >> i).max(1);
            let h = (self.height >> i).max(1);
            total.checked_add(per_level(w, h)?)
        })
    }

    /// Whether the payload is at least as large as the header implies.
    ///
    /// `None` when [`expected_payload_size`](Self::expected_payload_size) is unknown.
    pub fn is_payload_complete(&self) -> Option<bool> {
        self.expected_payload_size()
            .map(|expected| self.payload_size >= expected)
    }
}

/// Inspect DDS data held in memory.
pub fn inspect(data: &[u8]) -> Result<DdsSummary> {
    if data.len() < 4 {
        return Err(Error::InvalidHeader("file too small".into()));
    }

    let magic: [u8; 4] = [data[0], data[1], data[2], data[3]];
    if &magic != DDS_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let mut reader = BinaryReader::new(&data[4..]);
    let header: DdsHeader = reader.read_struct()?;

    let header_size = header.size;
    if header_size != DdsHeader::SIZE {
        return Err(Error::InvalidHeader(format!(
            "header size is {}, expected {}",
            header_size,
            DdsHeader::SIZE
        )));
    }

    let dx10: Option<DdsHeaderDxt10> = if header.is_dx10() {
        Some(reader.read_struct()?)
    } else {
        None
    };

    let pixel_format = header.pixel_format;
    Ok(DdsSummary {
        file_size: data.len(),
        header_size,
        flags: header.flags,
        width: header.width,
        height: header.height,
        pitch_or_linear_size: header.pitch_or_linear_size,
        mipmap_count: header.mipmap_count,
        pixel_flags: pixel_format.flags,
        four_cc: pixel_format.four_cc,
        rgb_bit_count: pixel_format.rgb_bit_count,
        dxgi_format: dx10.map(|h| h.dxgi_format),
        payload_size: reader.remaining(),
    })
}

/// Read a file and inspect its DDS header.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<DdsSummary> {
    let data = fs::read(path)?;
    inspect(&data)
}
