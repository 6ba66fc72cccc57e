//! DDS header structures.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// DDS file header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: u32,
    /// Header flags.
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Check if this is a DX10 extended header.
    pub fn is_dx10(&self) -> bool {
        self.pixel_format.has_four_cc() && self.pixel_format.four_cc == FourCC::DX10
    }
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    /// Pixel format flags.
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// `DDPF_FOURCC`: the `four_cc` field is meaningful.
    pub const FLAG_FOURCC: u32 = 0x4;
    /// `DDPF_RGB`: uncompressed RGB data, see `rgb_bit_count`.
    pub const FLAG_RGB: u32 = 0x40;

    /// Whether the FourCC flag is set.
    pub fn has_four_cc(&self) -> bool {
        let flags = self.flags;
        flags & Self::FLAG_FOURCC != 0
    }
}

/// Four-character code for compression type.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT3 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT5 compression.
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header.
    pub const DX10: Self = Self(*b"DX10");
    /// BC4U compression.
    pub const BC4U: Self = Self(*b"BC4U");
    /// BC4S compression.
    pub const BC4S: Self = Self(*b"BC4S");
    /// BC5U compression.
    pub const BC5U: Self = Self(*b"BC5U");
    /// BC5S compression.
    pub const BC5S: Self = Self(*b"BC5S");
    /// ATI2 (BC5) compression.
    pub const ATI2: Self = Self(*b"ATI2");

    /// Whether every byte is zero, as written by encoders for RGB surfaces.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self)
    }
}

/// DX10 extended header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeaderDxt10 {
    /// DXGI format.
    pub dxgi_format: u32,
    /// Resource dimension.
    pub resource_dimension: u32,
    /// Misc flags.
    pub misc_flag: u32,
    /// Array size.
    pub array_size: u32,
    /// Misc flags 2.
    pub misc_flags2: u32,
}

impl DdsHeaderDxt10 {
    /// BC1 UNORM format.
    pub const BC1_UNORM: u32 = 71;
    /// BC4 UNORM format.
    pub const BC4_UNORM: u32 = 80;
    /// BC4 SNORM format.
    pub const BC4_SNORM: u32 = 81;
    /// BC7 UNORM format.
    pub const BC7_UNORM: u32 = 98;
}

/// Get the block size for a block-compressed format.
///
/// Returns `None` when the format is not block compressed (or unknown).
pub fn block_size(four_cc: FourCC, dx10_format: Option<u32>) -> Option<usize> {
    match four_cc {
        FourCC::DXT1 | FourCC::BC4U | FourCC::BC4S => Some(8),
        FourCC::DXT3 | FourCC::DXT5 | FourCC::BC5U | FourCC::BC5S | FourCC::ATI2 => Some(16),
        FourCC::DX10 => match dx10_format? {
            // BC1 and BC4 families use 8 bytes per block
            70..=72 | 79..=81 => Some(8),
            // BC2, BC3, BC5, BC6H, BC7
            73..=78 | 82..=84 | 94..=99 => Some(16),
            _ => None,
        },
        _ => None,
    }
}

/// Calculate the size in bytes of a block-compressed mipmap level.
///
/// `None` if the size does not fit in `usize`.
pub fn mipmap_size(width: u32, height: u32, block_size: usize) -> Option<usize> {
    let blocks_x = (width as usize).div_ceil(4).max(1);
    let blocks_y = (height as usize).div_ceil(4).max(1);
    blocks_x.checked_mul(blocks_y)?.checked_mul(block_size)
}

/// Number of levels in a full mip chain for the given dimensions.
pub fn max_mip_levels(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_sizes() {
        assert_eq!(std::mem::size_of::<DdsHeader>(), DdsHeader::SIZE as usize);
        assert_eq!(std::mem::size_of::<DdsPixelFormat>(), 32);
        assert_eq!(std::mem::size_of::<DdsHeaderDxt10>(), 20);
    }

    #[test]
    fn test_mipmap_size_calculation() {
        // 4x4 block minimum
        assert_eq!(mipmap_size(1, 1, 16), Some(16));
        assert_eq!(mipmap_size(4, 4, 16), Some(16));
        assert_eq!(mipmap_size(8, 8, 8), Some(32));
        assert_eq!(mipmap_size(1024, 512, 16), Some(1024 * 512));
    }

    #[test]
    fn test_mipmap_size_overflow() {
        if usize::BITS == 64 {
            // 2^30 * 2^30 blocks * 16 bytes needs 64 bits
            assert_eq!(mipmap_size(u32::MAX, u32::MAX, 16), None);
        } else {
            assert_eq!(mipmap_size(u32::MAX, 4, 16), None);
        }
    }

    #[test]
    fn test_max_mip_levels() {
        assert_eq!(max_mip_levels(0, 0), 1);
        assert_eq!(max_mip_levels(1, 1), 1);
        assert_eq!(max_mip_levels(4, 4), 3);
        assert_eq!(max_mip_levels(1024, 16), 11);
        assert_eq!(max_mip_levels(u32::MAX, 1), 32);
    }

    #[test]
    fn test_block_size() {
        assert_eq!(block_size(FourCC::DXT1, None), Some(8));
        assert_eq!(block_size(FourCC::DXT5, None), Some(16));
        assert_eq!(block_size(FourCC::DX10, Some(DdsHeaderDxt10::BC4_UNORM)), Some(8));
        assert_eq!(block_size(FourCC::DX10, Some(DdsHeaderDxt10::BC7_UNORM)), Some(16));
        assert_eq!(block_size(FourCC::DX10, Some(28)), None);
        assert_eq!(block_size(FourCC([0; 4]), None), None);
    }

    #[test]
    fn test_four_cc_display() {
        assert_eq!(FourCC::DXT5.to_string(), "DXT5");
        assert_eq!(FourCC([b'A', 0, b'B', 1]).to_string(), "A\\x00B\\x01");
    }
}
