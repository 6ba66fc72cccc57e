//! PE/COFF header structures.
//!
//! Signatures and the optional header magic are read separately; the
//! structs here cover the fixed-size records that follow them.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Offset of `e_lfanew` inside the DOS header.
pub const E_LFANEW_OFFSET: usize = 0x3C;

/// `PE\0\0`.
pub const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";

/// Optional header magic for 32-bit images.
pub const PE32_MAGIC: u16 = 0x10b;

/// Optional header magic for 64-bit images.
pub const PE32_PLUS_MAGIC: u16 = 0x20b;

/// COFF file header (without the `PE\0\0` signature).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct CoffHeader {
    /// Target machine type
    pub machine: u16,
    /// Number of entries in the section table
    pub number_of_sections: u16,
    /// Link time
    pub time_date_stamp: u32,
    /// Deprecated COFF symbol table offset
    pub pointer_to_symbol_table: u32,
    /// Deprecated COFF symbol count
    pub number_of_symbols: u32,
    /// Size of the optional header that follows
    pub size_of_optional_header: u16,
    /// Image characteristics
    pub characteristics: u16,
}

/// One entry of the optional header's data directory array.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    /// Whether the directory is absent.
    pub fn is_empty(&self) -> bool {
        self.virtual_address == 0
    }

    /// Whether `rva` lies inside this directory.
    pub fn contains(&self, rva: u32) -> bool {
        let start = self.virtual_address;
        rva >= start && rva < start.saturating_add(self.size)
    }
}

/// Section table entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct SectionHeader {
    /// Null-padded section name
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_linenumbers: u32,
    pub number_of_relocations: u16,
    pub number_of_linenumbers: u16,
    pub characteristics: u32,
}

impl SectionHeader {
    /// Map an RVA inside this section to a file offset.
    pub fn file_offset(&self, rva: u32) -> Option<usize> {
        let start = self.virtual_address;
        let extent = self.virtual_size.max(self.size_of_raw_data);
        if rva < start || rva - start >= extent {
            return None;
        }
        Some((rva - start) as usize + self.pointer_to_raw_data as usize)
    }
}

/// Export directory table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ExportDirectory {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// RVA of the DLL's own name
    pub name_rva: u32,
    /// Starting ordinal number
    pub ordinal_base: u32,
    /// Entries in the export address table
    pub number_of_functions: u32,
    /// Entries in the name pointer and ordinal tables
    pub number_of_names: u32,
    pub address_of_functions: u32,
    pub address_of_names: u32,
    pub address_of_name_ordinals: u32,
}

/// Target machine from the COFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    I386,
    Amd64,
    Arm64,
    Other(u16),
}

impl Machine {
    /// Whether the running process could load an image built for this machine.
    pub fn matches_host(&self) -> bool {
        match self {
            Machine::I386 => cfg!(target_arch = "x86"),
            Machine::Amd64 => cfg!(target_arch = "x86_64"),
            Machine::Arm64 => cfg!(target_arch = "aarch64"),
            Machine::Other(_) => false,
        }
    }
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0x014c => Machine::I386,
            0x8664 => Machine::Amd64,
            0xaa64 => Machine::Arm64,
            other => Machine::Other(other),
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::I386 => write!(f, "x86 (32-bit)"),
            Machine::Amd64 => write!(f, "x86-64"),
            Machine::Arm64 => write!(f, "ARM64"),
            Machine::Other(m) => write!(f, "unknown ({:#06x})", m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(std::mem::size_of::<CoffHeader>(), 20);
        assert_eq!(std::mem::size_of::<DataDirectory>(), 8);
        assert_eq!(std::mem::size_of::<SectionHeader>(), 40);
        assert_eq!(std::mem::size_of::<ExportDirectory>(), 40);
    }

    #[test]
    fn test_section_mapping() {
        let section = SectionHeader {
            name: *b".rdata\0\0",
            virtual_size: 0x100,
            virtual_address: 0x2000,
            size_of_raw_data: 0x200,
            pointer_to_raw_data: 0x400,
            pointer_to_relocations: 0,
            pointer_to_linenumbers: 0,
            number_of_relocations: 0,
            number_of_linenumbers: 0,
            characteristics: 0,
        };

        assert_eq!(section.file_offset(0x2000), Some(0x400));
        assert_eq!(section.file_offset(0x21FF), Some(0x5FF));
        assert_eq!(section.file_offset(0x2200), None);
        assert_eq!(section.file_offset(0x1FFF), None);
    }

    #[test]
    fn test_machine_names() {
        assert_eq!(Machine::from(0x014c), Machine::I386);
        assert_eq!(Machine::from(0x8664).to_string(), "x86-64");
        assert_eq!(Machine::from(0x1234), Machine::Other(0x1234));
        assert!(!Machine::Other(0).matches_host());
    }
}
