//! WOFF2 to SFNT decoding.
//!
//! The table stream is Brotli-decompressed, transformed `glyf`/`loca` and
//! `hmtx` tables are rebuilt, and the tables are reassembled into an SFNT with
//! `FontBuilder`, which recomputes checksums.

use std::io::Read;

use anyhow::{Context, Result, anyhow, bail, ensure};
use read_fonts::{
    FontData, FontRead, FontRef,
    tables::{hhea::Hhea, maxp::Maxp},
    types::{FixedSize, Scalar, Tag},
};
use write_fonts::FontBuilder;

use crate::{WOFF2_MAGIC, transform};

const HEADER_LEN: usize = 48;
const BROTLI_BUFFER_SIZE: usize = 4096;

const TRUETYPE_FLAVOR: u32 = 0x0001_0000;
const COLLECTION_FLAVOR: u32 = u32::from_be_bytes(*b"ttcf");

const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");
const HMTX: Tag = Tag::new(b"hmtx");
const HHEA: Tag = Tag::new(b"hhea");
const HEAD: Tag = Tag::new(b"head");
const MAXP: Tag = Tag::new(b"maxp");

/// Tags addressed by index in the table directory flags.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Forward-only reader over big-endian font data.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    data: FontData<'a>,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data: FontData::new(data), pos: 0 }
    }

    pub(crate) fn read<T: Scalar>(&mut self) -> Result<T> {
        let value = self
            .data
            .read_at::<T>(self.pos)
            .map_err(|_| anyhow!("unexpected end of data at offset {}", self.pos))?;
        self.pos += <T as FixedSize>::RAW_BYTE_LEN;
        Ok(value)
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self
            .pos
            .checked_add(len)
            .and_then(|end| self.data.as_bytes().get(self.pos..end))
            .ok_or_else(|| anyhow!("{len} bytes at offset {} run past the data", self.pos))?;
        self.pos += len;
        Ok(bytes)
    }

    /// Variable-length `UIntBase128`.
    pub(crate) fn base128(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for i in 0..5 {
            let byte: u8 = self.read()?;
            ensure!(i > 0 || byte != 0x80, "UIntBase128 has a leading zero byte");
            ensure!(value & 0xFE00_0000 == 0, "UIntBase128 overflows 32 bits");
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        bail!("UIntBase128 is longer than 5 bytes")
    }

    /// Variable-length `255UInt16`.
    pub(crate) fn uint255(&mut self) -> Result<u16> {
        const WORD_CODE: u8 = 253;
        const ONE_MORE_BYTE_CODE2: u8 = 254;
        const ONE_MORE_BYTE_CODE1: u8 = 255;
        const LOWEST_U_CODE: u16 = 253;

        Ok(match self.read::<u8>()? {
            WORD_CODE => self.read::<u16>()?,
            ONE_MORE_BYTE_CODE1 => u16::from(self.read::<u8>()?) + LOWEST_U_CODE,
            ONE_MORE_BYTE_CODE2 => u16::from(self.read::<u8>()?) + LOWEST_U_CODE * 2,
            code => u16::from(code),
        })
    }
}

/// One entry of the WOFF2 table directory.
#[derive(Debug, Clone, Copy)]
struct TableEntry {
    tag: Tag,
    transform_version: u8,
    /// Length of the table in the decoded font.
    orig_length: u32,
    /// Length of the table in the decompressed stream.
    stream_length: u32,
}

impl TableEntry {
    fn read(directory: &mut Reader) -> Result<Self> {
        let flags: u8 = directory.read()?;
        let tag = match usize::from(flags & 0x3F) {
            63 => directory.read::<Tag>()?,
            index => Tag::new(KNOWN_TAGS[index]),
        };
        let transform_version = flags >> 6;
        let orig_length = directory.base128()?;

        let mut entry = Self { tag, transform_version, orig_length, stream_length: orig_length };
        if entry.is_transformed() {
            entry.stream_length = directory.base128()?;
            ensure!(
                tag != LOCA || entry.stream_length == 0,
                "transformed loca must have an empty stream"
            );
        }
        Ok(entry)
    }

    /// Version 0 is the null transform except for `glyf`/`loca`, where it is
    /// version 3.
    fn is_transformed(&self) -> bool {
        if self.tag == GLYF || self.tag == LOCA {
            self.transform_version != 3
        } else {
            self.transform_version != 0
        }
    }
}

/// Decode a WOFF2 file into SFNT data.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut header = Reader::new(data);
    ensure!(header.bytes(4)? == WOFF2_MAGIC, "not a WOFF2 file");
    let flavor: u32 = header.read()?;
    ensure!(flavor != COLLECTION_FLAVOR, "WOFF2 font collections are not supported");
    let length: u32 = header.read()?;
    ensure!(
        length as usize <= data.len(),
        "WOFF2 header declares {length} bytes but the file has {}",
        data.len()
    );
    let num_tables: u16 = header.read()?;
    ensure!(num_tables > 0, "WOFF2 file has no tables");
    let _reserved: u16 = header.read()?;
    let _total_sfnt_size: u32 = header.read()?;
    let total_compressed_size: u32 = header.read()?;
    // version, metadata and private blocks
    header.bytes(HEADER_LEN - 24)?;

    let entries = (0..num_tables)
        .map(|_| TableEntry::read(&mut header))
        .collect::<Result<Vec<_>>>()
        .context("Failed to read WOFF2 table directory")?;

    let compressed = header
        .bytes(total_compressed_size as usize)
        .context("WOFF2 table data is truncated")?;
    let mut stream = Vec::new();
    brotli::Decompressor::new(compressed, BROTLI_BUFFER_SIZE)
        .read_to_end(&mut stream)
        .context("Failed to decompress WOFF2 table data")?;

    let mut tables = Vec::with_capacity(entries.len());
    let mut offset = 0usize;
    for entry in &entries {
        let end = offset + entry.stream_length as usize;
        let bytes = stream.get(offset..end).ok_or_else(|| {
            anyhow!("'{}' table runs past the decompressed data", entry.tag)
        })?;
        tables.push((*entry, bytes));
        offset = end;
    }

    let sfnt = assemble(&tables)?;
    if flavor == TRUETYPE_FLAVOR { Ok(sfnt) } else { set_sfnt_version(sfnt, flavor) }
}

fn assemble(tables: &[(TableEntry, &[u8])]) -> Result<Vec<u8>> {
    let find = |tag: Tag| tables.iter().find(|(entry, _)| entry.tag == tag);

    let mut builder = FontBuilder::new();
    let mut x_mins = None;
    for (entry, bytes) in tables {
        if !entry.is_transformed() {
            builder.add_raw(entry.tag, *bytes);
            continue;
        }
        match entry.tag {
            GLYF => {
                let (loca, _) = find(LOCA).context("transformed glyf without a loca table")?;
                ensure!(loca.is_transformed(), "transformed glyf with an untransformed loca");
                let glyphs = transform::reconstruct_glyf(bytes, loca.orig_length)
                    .context("Failed to rebuild glyf table")?;
                builder.add_raw(GLYF, glyphs.glyf);
                builder.add_raw(LOCA, glyphs.loca);
                x_mins = Some(glyphs.x_mins);
            }
            LOCA => {
                let (glyf, _) = find(GLYF).context("transformed loca without a glyf table")?;
                ensure!(glyf.is_transformed(), "transformed loca with an untransformed glyf");
            }
            HMTX => {}
            tag => bail!("unsupported transform {} for '{tag}'", entry.transform_version),
        }
    }

    if let Some((entry, bytes)) = find(HMTX)
        && entry.is_transformed()
    {
        let x_mins = x_mins.as_deref().context("transformed hmtx without a transformed glyf")?;
        let table_data = |tag: Tag| {
            find(tag)
                .map(|(_, bytes)| FontData::new(bytes))
                .with_context(|| format!("transformed hmtx without a {tag} table"))
        };
        let num_h_metrics = Hhea::read(table_data(HHEA)?)?.number_of_h_metrics();
        let num_glyphs = Maxp::read(table_data(MAXP)?)?.num_glyphs();
        ensure!(
            usize::from(num_glyphs) == x_mins.len(),
            "maxp has {num_glyphs} glyphs but glyf has {}",
            x_mins.len()
        );
        let hmtx = transform::reconstruct_hmtx(bytes, num_h_metrics, x_mins)
            .context("Failed to rebuild hmtx table")?;
        builder.add_raw(HMTX, hmtx);
    }

    Ok(builder.build())
}

/// Replace the TrueType version `FontBuilder` writes, keeping
/// `checksumAdjustment` consistent.
fn set_sfnt_version(mut sfnt: Vec<u8>, version: u32) -> Result<Vec<u8>> {
    let old = u32::from_be_bytes([sfnt[0], sfnt[1], sfnt[2], sfnt[3]]);
    sfnt[..4].copy_from_slice(&version.to_be_bytes());

    let head_offset = FontRef::new(&sfnt)
        .context("Failed to parse decoded font")?
        .table_directory
        .table_records()
        .iter()
        .find(|record| record.tag() == HEAD)
        .map(|record| record.offset() as usize);
    if let Some(offset) = head_offset {
        let field = sfnt
            .get_mut(offset + 8..offset + 12)
            .context("head table is too short")?;
        let adjustment = u32::from_be_bytes([field[0], field[1], field[2], field[3]]);
        let adjustment = adjustment.wrapping_sub(version.wrapping_sub(old));
        field.copy_from_slice(&adjustment.to_be_bytes());
    }
    Ok(sfnt)
}
