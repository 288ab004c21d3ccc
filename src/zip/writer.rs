//! Minimal in-memory ZIP writer.
//!
//! Produces plain (non-ZIP64) archives with STORED or DEFLATE entries.
//! Names are written exactly as given; validation is the reader's job.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::error::{Error, Result};

use super::structures::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, FLAG_UTF8, HOST_UNIX, LFH_SIGNATURE,
};

/// Version made by: Unix host, zip format version 3.0
const VERSION_MADE_BY: u16 = ((HOST_UNIX as u16) << 8) | 30;
/// Version needed to extract: 2.0 (deflate, directories)
const VERSION_NEEDED: u16 = 20;

/// 1980-01-01 00:00:00, the DOS epoch
const DOS_DATE: u16 = (1 << 5) | 1;
const DOS_TIME: u16 = 0;

const S_IFREG: u32 = 0o100000;
const S_IFDIR: u32 = 0o040000;

/// Per-entry options for [`ZipWriter::add_file`].
#[derive(Debug, Clone, Copy)]
pub struct EntryOptions {
    method: CompressionMethod,
    unix_mode: u32,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Stored,
            unix_mode: 0o644,
        }
    }
}

impl EntryOptions {
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn unix_mode(mut self, mode: u32) -> Self {
        self.unix_mode = mode & 0o777;
        self
    }
}

struct CentralRecord {
    name: Vec<u8>,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    external_attrs: u32,
    lfh_offset: u32,
}

/// Builds a zip archive in memory.
///
/// ```
/// use wgtfile::zip::{EntryOptions, ZipWriter};
///
/// let mut zip = ZipWriter::new();
/// zip.add_directory("images/").unwrap();
/// zip.add_file("config.xml", b"<widget/>", EntryOptions::default()).unwrap();
/// let bytes = zip.finish().unwrap();
/// assert!(bytes.starts_with(b"PK\x03\x04"));
/// ```
#[derive(Default)]
pub struct ZipWriter {
    buf: Vec<u8>,
    central: Vec<CentralRecord>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory marker. A trailing `/` is appended when missing.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let mut name = name.to_string();
        if !name.ends_with('/') {
            name.push('/');
        }
        self.push_entry(
            &name,
            &[],
            CompressionMethod::Stored,
            (S_IFDIR | 0o755) << 16,
        )
    }

    pub fn add_file(&mut self, name: &str, data: &[u8], options: EntryOptions) -> Result<()> {
        self.push_entry(
            name,
            data,
            options.method,
            (S_IFREG | options.unix_mode) << 16,
        )
    }

    fn push_entry(
        &mut self,
        name: &str,
        data: &[u8],
        method: CompressionMethod,
        external_attrs: u32,
    ) -> Result<()> {
        let name_len = u16::try_from(name.len())
            .map_err(|_| Error::format(format!("entry name too long: {} bytes", name.len())))?;
        if self.central.len() >= u16::MAX as usize {
            return Err(Error::format("too many entries for a non-ZIP64 archive"));
        }

        let mut crc = flate2::Crc::new();
        crc.update(data);

        let payload = match method {
            CompressionMethod::Stored => data.to_vec(),
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?
            }
            CompressionMethod::Unknown(m) => {
                return Err(Error::format(format!("cannot write compression method {m}")));
            }
        };

        let too_large = || Error::format(format!("'{name}' is too large for a non-ZIP64 archive"));
        let compressed_size = u32::try_from(payload.len()).map_err(|_| too_large())?;
        let uncompressed_size = u32::try_from(data.len()).map_err(|_| too_large())?;
        let lfh_offset = u32::try_from(self.buf.len()).map_err(|_| too_large())?;

        let out = &mut self.buf;
        out.extend_from_slice(LFH_SIGNATURE);
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(FLAG_UTF8)?;
        out.write_u16::<LittleEndian>(method.as_u16())?;
        out.write_u16::<LittleEndian>(DOS_TIME)?;
        out.write_u16::<LittleEndian>(DOS_DATE)?;
        out.write_u32::<LittleEndian>(crc.sum())?;
        out.write_u32::<LittleEndian>(compressed_size)?;
        out.write_u32::<LittleEndian>(uncompressed_size)?;
        out.write_u16::<LittleEndian>(name_len)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&payload);

        self.central.push(CentralRecord {
            name: name.as_bytes().to_vec(),
            method: method.as_u16(),
            crc32: crc.sum(),
            compressed_size,
            uncompressed_size,
            external_attrs,
            lfh_offset,
        });
        Ok(())
    }

    /// Write the central directory and return the finished archive.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = u32::try_from(self.buf.len())
            .map_err(|_| Error::format("archive too large for a non-ZIP64 archive"))?;

        let out = &mut self.buf;
        for record in &self.central {
            out.extend_from_slice(CDFH_SIGNATURE);
            out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
            out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
            out.write_u16::<LittleEndian>(FLAG_UTF8)?;
            out.write_u16::<LittleEndian>(record.method)?;
            out.write_u16::<LittleEndian>(DOS_TIME)?;
            out.write_u16::<LittleEndian>(DOS_DATE)?;
            out.write_u32::<LittleEndian>(record.crc32)?;
            out.write_u32::<LittleEndian>(record.compressed_size)?;
            out.write_u32::<LittleEndian>(record.uncompressed_size)?;
            out.write_u16::<LittleEndian>(record.name.len() as u16)?;
            out.write_u16::<LittleEndian>(0)?; // extra field length
            out.write_u16::<LittleEndian>(0)?; // comment length
            out.write_u16::<LittleEndian>(0)?; // disk number start
            out.write_u16::<LittleEndian>(0)?; // internal attributes
            out.write_u32::<LittleEndian>(record.external_attrs)?;
            out.write_u32::<LittleEndian>(record.lfh_offset)?;
            out.extend_from_slice(&record.name);
        }

        let cd_size = u32::try_from(out.len() - cd_offset as usize)
            .map_err(|_| Error::format("central directory too large"))?;
        let entries = self.central.len() as u16;

        out.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        out.write_u16::<LittleEndian>(0)?; // disk number
        out.write_u16::<LittleEndian>(0)?; // disk with central directory
        out.write_u16::<LittleEndian>(entries)?;
        out.write_u16::<LittleEndian>(entries)?;
        out.write_u32::<LittleEndian>(cd_size)?;
        out.write_u32::<LittleEndian>(cd_offset)?;
        out.write_u16::<LittleEndian>(0)?; // comment length

        Ok(self.buf)
    }
}
