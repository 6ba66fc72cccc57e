//! Export table reading.

use std::fs;
use std::path::Path;

use ozd_common::BinaryReader;

use crate::headers::{
    CoffHeader, DataDirectory, ExportDirectory, Machine, SectionHeader, E_LFANEW_OFFSET,
    PE32_MAGIC, PE32_PLUS_MAGIC, PE_SIGNATURE,
};
use crate::{Error, Result};

/// A named export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    /// Ordinal, already biased by the directory's ordinal base.
    pub ordinal: u32,
    pub rva: u32,
    /// Target of a forwarded export (`OTHER.Function`).
    pub forwarder: Option<String>,
}

/// The named exports of a PE image.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub machine: Machine,
    /// Name the DLL was linked as, if the export directory records one.
    pub dll_name: Option<String>,
    pub ordinal_base: u32,
    /// Size of the export address table, including ordinal-only exports.
    pub function_count: u32,
    /// Named exports in name pointer table order.
    pub entries: Vec<Export>,
}

impl ExportTable {
    /// Read a PE image from disk and collect its exports.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Collect the exports of an in-memory PE image.
    ///
    /// An image without an export directory yields an empty table.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let image = PeImage::parse(data)?;

        let mut table = Self {
            machine: image.machine,
            dll_name: None,
            ordinal_base: 0,
            function_count: 0,
            entries: Vec::new(),
        };

        if image.export_dir.is_empty() {
            return Ok(table);
        }

        let mut reader = BinaryReader::new_at(data, image.offset(image.export_dir.virtual_address)?)?;
        let dir: ExportDirectory = reader.read_struct()?;

        let name_rva = dir.name_rva;
        if name_rva != 0 {
            table.dll_name = Some(image.cstring(name_rva)?.to_owned());
        }
        table.ordinal_base = dir.ordinal_base;
        table.function_count = dir.number_of_functions;

        let functions = image.u32_table(dir.address_of_functions, dir.number_of_functions)?;
        let names = image.u32_table(dir.address_of_names, dir.number_of_names)?;
        let ordinals = image.u16_table(dir.address_of_name_ordinals, dir.number_of_names)?;

        for (&name_rva, &index) in names.iter().zip(&ordinals) {
            let rva = *functions
                .get(index as usize)
                .ok_or(Error::OrdinalOutOfRange {
                    index,
                    count: table.function_count,
                })?;

            let forwarder = if image.export_dir.contains(rva) {
                Some(image.cstring(rva)?.to_owned())
            } else {
                None
            };

            let ordinal = table
                .ordinal_base
                .checked_add(u32::from(index))
                .ok_or(Error::OrdinalOverflow {
                    base: table.ordinal_base,
                    index,
                })?;

            table.entries.push(Export {
                name: image.cstring(name_rva)?.to_owned(),
                ordinal,
                rva,
                forwarder,
            });
        }

        Ok(table)
    }

    /// Look up an export by exact name.
    pub fn find(&self, name: &str) -> Option<&Export> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Iterate over export names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of named exports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the image has no named exports.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The parts of a PE image needed to walk its exports.
struct PeImage<'a> {
    data: &'a [u8],
    machine: Machine,
    export_dir: DataDirectory,
    sections: Vec<SectionHeader>,
}

impl<'a> PeImage<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(b"MZ").map_err(|_| Error::NotMz)?;
        reader.seek(E_LFANEW_OFFSET);
        let pe_offset = reader.read_u32()? as usize;

        let mut reader = BinaryReader::new_at(data, pe_offset)?;
        if reader.read_bytes(4).ok() != Some(&PE_SIGNATURE[..]) {
            return Err(Error::InvalidPeSignature(pe_offset));
        }

        let coff: CoffHeader = reader.read_struct()?;
        let optional_start = reader.position();

        // NumberOfRvaAndSizes sits right before the data directories
        let dir_count_offset = match reader.read_u16()? {
            PE32_MAGIC => 92,
            PE32_PLUS_MAGIC => 108,
            other => return Err(Error::UnsupportedOptionalHeader(other)),
        };
        reader.seek(optional_start + dir_count_offset);
        let export_dir = if reader.read_u32()? > 0 {
            reader.read_struct()?
        } else {
            DataDirectory::default()
        };

        reader.seek(optional_start + coff.size_of_optional_header as usize);
        let sections = (0..coff.number_of_sections)
            .map(|_| reader.read_struct::<SectionHeader>())
            .collect::<ozd_common::Result<Vec<_>>>()?;

        Ok(Self {
            data,
            machine: Machine::from(coff.machine),
            export_dir,
            sections,
        })
    }

    fn offset(&self, rva: u32) -> Result<usize> {
        self.sections
            .iter()
            .find_map(|s| s.file_offset(rva))
            .ok_or(Error::UnmappedRva(rva))
    }

    fn reader_at(&self, rva: u32) -> Result<BinaryReader<'a>> {
        Ok(BinaryReader::new_at(self.data, self.offset(rva)?)?)
    }

    fn cstring(&self, rva: u32) -> Result<&'a str> {
        Ok(self.reader_at(rva)?.read_cstring()?)
    }

    fn u32_table(&self, rva: u32, count: u32) -> Result<Vec<u32>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader_at(rva)?;
        let mut table = Vec::new();
        for _ in 0..count {
            table.push(reader.read_u32()?);
        }
        Ok(table)
    }

    fn u16_table(&self, rva: u32, count: u32) -> Result<Vec<u16>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader_at(rva)?;
        let mut table = Vec::new();
        for _ in 0..count {
            table.push(reader.read_u16()?);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    const SECTION_RVA: u32 = 0x1000;
    const SECTION_FILE: usize = 0x200;

    fn put(image: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
        if image.len() < offset + bytes.len() {
            image.resize(offset + bytes.len(), 0);
        }
        image[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn at(rva: u32) -> usize {
        SECTION_FILE + (rva - SECTION_RVA) as usize
    }

    /// Minimal PE32 DLL with one `.rdata` section holding the export data.
    fn build_dll(with_exports: bool) -> Vec<u8> {
        let mut image = Vec::new();
        put(&mut image, 0, b"MZ");
        put(&mut image, E_LFANEW_OFFSET, &0x40u32.to_le_bytes());
        put(&mut image, 0x40, PE_SIGNATURE);

        let optional_size: u16 = 96 + 16 * 8;
        let coff = CoffHeader {
            machine: 0x014c,
            number_of_sections: 1,
            time_date_stamp: 0,
            pointer_to_symbol_table: 0,
            number_of_symbols: 0,
            size_of_optional_header: optional_size,
            characteristics: 0x2102,
        };
        put(&mut image, 0x44, coff.as_bytes());

        let optional = 0x44 + 20;
        put(&mut image, optional, &PE32_MAGIC.to_le_bytes());
        put(&mut image, optional + 92, &16u32.to_le_bytes());
        if with_exports {
            let dir = DataDirectory {
                virtual_address: 0x1000,
                size: 0x100,
            };
            put(&mut image, optional + 96, dir.as_bytes());
        }

        let section = SectionHeader {
            name: *b".rdata\0\0",
            virtual_size: 0x200,
            virtual_address: SECTION_RVA,
            size_of_raw_data: 0x200,
            pointer_to_raw_data: SECTION_FILE as u32,
            pointer_to_relocations: 0,
            pointer_to_linenumbers: 0,
            number_of_relocations: 0,
            number_of_linenumbers: 0,
            characteristics: 0x4000_0040,
        };
        put(&mut image, optional + optional_size as usize, section.as_bytes());
        image.resize(SECTION_FILE + 0x200, 0);

        if !with_exports {
            return image;
        }

        let dir = ExportDirectory {
            characteristics: 0,
            time_date_stamp: 0,
            major_version: 0,
            minor_version: 0,
            name_rva: 0x1080,
            ordinal_base: 1,
            number_of_functions: 3,
            number_of_names: 2,
            address_of_functions: 0x1040,
            address_of_names: 0x1050,
            address_of_name_ordinals: 0x1060,
        };
        put(&mut image, at(0x1000), dir.as_bytes());

        // Function 1 is ordinal-only, function 2 forwards into KERNEL32
        for (i, rva) in [0x5000u32, 0x5100, 0x10A0].iter().enumerate() {
            put(&mut image, at(0x1040) + i * 4, &rva.to_le_bytes());
        }
        put(&mut image, at(0x1050), &0x1090u32.to_le_bytes());
        put(&mut image, at(0x1054), &0x10C0u32.to_le_bytes());
        put(&mut image, at(0x1060), &0u16.to_le_bytes());
        put(&mut image, at(0x1062), &2u16.to_le_bytes());

        put(&mut image, at(0x1080), b"ozd.dll\0");
        put(&mut image, at(0x1090), b"ImagenConvert\0");
        put(&mut image, at(0x10A0), b"KERNEL32.Sleep\0");
        put(&mut image, at(0x10C0), b"OpenImage\0");
        image
    }

    #[test]
    fn test_parse_exports() {
        let table = ExportTable::parse(&build_dll(true)).unwrap();

        assert_eq!(table.machine, Machine::I386);
        assert_eq!(table.dll_name.as_deref(), Some("ozd.dll"));
        assert_eq!(table.ordinal_base, 1);
        assert_eq!(table.function_count, 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.names().collect::<Vec<_>>(), ["ImagenConvert", "OpenImage"]);

        let convert = table.find("ImagenConvert").unwrap();
        assert_eq!(convert.ordinal, 1);
        assert_eq!(convert.rva, 0x5000);
        assert_eq!(convert.forwarder, None);

        let open = table.find("OpenImage").unwrap();
        assert_eq!(open.ordinal, 3);
        assert_eq!(open.forwarder.as_deref(), Some("KERNEL32.Sleep"));
    }

    #[test]
    fn test_no_export_directory() {
        let table = ExportTable::parse(&build_dll(false)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.dll_name, None);
    }

    #[test]
    fn test_rejects_non_pe() {
        assert!(matches!(ExportTable::parse(b"OZD\x01\x02"), Err(Error::NotMz)));

        let mut image = build_dll(true);
        put(&mut image, 0x40, b"NE\0\0");
        assert!(matches!(
            ExportTable::parse(&image),
            Err(Error::InvalidPeSignature(0x40))
        ));
    }

    #[test]
    fn test_rejects_unknown_optional_magic() {
        let mut image = build_dll(true);
        put(&mut image, 0x44 + 20, &0x0107u16.to_le_bytes());
        assert!(matches!(
            ExportTable::parse(&image),
            Err(Error::UnsupportedOptionalHeader(0x0107))
        ));
    }

    #[test]
    fn test_ordinal_out_of_range() {
        let mut image = build_dll(true);
        put(&mut image, at(0x1062), &7u16.to_le_bytes());
        assert!(matches!(
            ExportTable::parse(&image),
            Err(Error::OrdinalOutOfRange { index: 7, count: 3 })
        ));
    }

    #[test]
    fn test_ordinal_base_overflow() {
        let mut image = build_dll(true);
        // ordinal_base sits 16 bytes into the export directory
        put(&mut image, at(0x1000) + 16, &u32::MAX.to_le_bytes());
        assert!(matches!(
            ExportTable::parse(&image),
            Err(Error::OrdinalOverflow { base: u32::MAX, index: 2 })
        ));
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozd.dll");
        fs::write(&path, build_dll(true)).unwrap();

        let table = ExportTable::open(&path).unwrap();
        assert!(table.find("ImagenConvert").is_some());
    }
}
