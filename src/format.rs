//! On-disk Records
//!
//! All integers are little endian with no padding.
//! * file header, 12 bytes: version, directory offset, resource count
//! * resource header, 36 bytes, precedes each payload: start code "RSRC", chunk size
//!   (header plus payload), compressed size, uncompressed size, hash, flags,
//!   compression code, extension code, name
//! * directory entry, 22 bytes, one per resource at the end of the file:
//!   hash, offset of the resource header, extension code, name

use std::io::{Read,Write};
use byteorder::{LittleEndian,ReadBytesExt,WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use crate::name::{ResourceName,MAX_RESOURCE_NAME};
use crate::Error;

/// the only supported version, major version 4 in the upper bits
pub const RESUTIL_VERSION: u32 = 0x00000400;
pub const RESOURCE_START_CODE: u32 = 1129468754; // "RSRC"
pub const MAX_RESOURCE_SIZE: u32 = 0x7FFFFFFF;
pub const END_OF_HEADER: u32 = 12;
pub const SIZE_OF_RHEADER: u32 = 36;
pub const SIZE_OF_DIRENTRY: u32 = 22;

pub const SUPPORTED_EXTENSIONS: [&str;4] = ["","PCX","FLC","WAV"];
pub const COMPRESSION_TYPES: [&str;3] = ["not  compressed","RLE  compressed","LZSS compressed"];

/// payload is the bitmap form of a PCX
pub const FLAG_BITMAP: u8 = 0x01;
/// the bitmap was rotated
pub const FLAG_ROTATED: u8 = 0x02;
/// hash was computed with the ID scheme
pub const FLAG_ID_HASH: u8 = 0x10;

#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq,Eq)]
pub enum Extension {
    Unknown = 0,
    Pcx = 1,
    Flc = 2,
    Wav = 3
}

#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq,Eq)]
pub enum Compression {
    None = 0,
    /// code is reserved, no resource uses it
    Rle = 1,
    Lzss = 2
}

/// true if every bit of `value` is set in `bitfield`
pub fn check_flag(bitfield: u8,value: u8) -> bool {
    bitfield & value == value
}

impl Extension {
    /// Extension code for a file name, anything not in the table is `Unknown`
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rfind('.') {
            Some(idx) => name[idx+1..].to_ascii_uppercase(),
            None => return Self::Unknown
        };
        match SUPPORTED_EXTENSIONS.iter().skip(1).position(|x| *x==ext) {
            Some(idx) => Self::from_usize(idx + 1).unwrap_or(Self::Unknown),
            None => Self::Unknown
        }
    }
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_u8(code)
    }
    pub fn as_str(&self) -> &'static str {
        SUPPORTED_EXTENSIONS[*self as usize]
    }
}

impl Compression {
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_u8(code)
    }
    pub fn as_str(&self) -> &'static str {
        COMPRESSION_TYPES[*self as usize]
    }
}

#[derive(Clone,Debug,PartialEq)]
pub struct FileHeader {
    pub version: u32,
    pub directory_offset: u32,
    pub resource_count: u32
}

#[derive(Clone,Debug,PartialEq)]
pub struct DirectoryEntry {
    pub hash: u32,
    pub offset: u32,
    pub extension: u8,
    pub filename: ResourceName
}

#[derive(Clone,Debug,PartialEq,Default)]
pub struct ResourceHeader {
    pub startcode: u32,
    pub chunk_size: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub hash: u32,
    pub flags: u8,
    pub compression_code: u8,
    pub extension: u8,
    pub filename: ResourceName
}

fn read_name<R: Read>(rdr: &mut R) -> std::io::Result<ResourceName> {
    let mut buf = [0;MAX_RESOURCE_NAME];
    rdr.read_exact(&mut buf)?;
    Ok(ResourceName::from_bytes(buf))
}

impl FileHeader {
    /// header of an empty resource file
    pub fn new() -> Self {
        Self {
            version: RESUTIL_VERSION,
            directory_offset: END_OF_HEADER,
            resource_count: 0
        }
    }
    pub fn read<R: Read>(rdr: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            version: rdr.read_u32::<LittleEndian>()?,
            directory_offset: rdr.read_u32::<LittleEndian>()?,
            resource_count: rdr.read_u32::<LittleEndian>()?
        })
    }
    pub fn write<W: Write>(&self,wtr: &mut W) -> std::io::Result<()> {
        wtr.write_u32::<LittleEndian>(self.version)?;
        wtr.write_u32::<LittleEndian>(self.directory_offset)?;
        wtr.write_u32::<LittleEndian>(self.resource_count)
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryEntry {
    pub fn read<R: Read>(rdr: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            hash: rdr.read_u32::<LittleEndian>()?,
            offset: rdr.read_u32::<LittleEndian>()?,
            extension: rdr.read_u8()?,
            filename: read_name(rdr)?
        })
    }
    pub fn write<W: Write>(&self,wtr: &mut W) -> std::io::Result<()> {
        wtr.write_u32::<LittleEndian>(self.hash)?;
        wtr.write_u32::<LittleEndian>(self.offset)?;
        wtr.write_u8(self.extension)?;
        wtr.write_all(self.filename.as_bytes())
    }
}

impl ResourceHeader {
    /// Read the fields without any checks, see `validate`
    pub fn read<R: Read>(rdr: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            startcode: rdr.read_u32::<LittleEndian>()?,
            chunk_size: rdr.read_u32::<LittleEndian>()?,
            compressed_size: rdr.read_u32::<LittleEndian>()?,
            uncompressed_size: rdr.read_u32::<LittleEndian>()?,
            hash: rdr.read_u32::<LittleEndian>()?,
            flags: rdr.read_u8()?,
            compression_code: rdr.read_u8()?,
            extension: rdr.read_u8()?,
            filename: read_name(rdr)?
        })
    }
    pub fn write<W: Write>(&self,wtr: &mut W) -> std::io::Result<()> {
        wtr.write_u32::<LittleEndian>(self.startcode)?;
        wtr.write_u32::<LittleEndian>(self.chunk_size)?;
        wtr.write_u32::<LittleEndian>(self.compressed_size)?;
        wtr.write_u32::<LittleEndian>(self.uncompressed_size)?;
        wtr.write_u32::<LittleEndian>(self.hash)?;
        wtr.write_u8(self.flags)?;
        wtr.write_u8(self.compression_code)?;
        wtr.write_u8(self.extension)?;
        wtr.write_all(self.filename.as_bytes())
    }
    pub fn validate(&self) -> Result<(),Error> {
        if self.startcode != RESOURCE_START_CODE {
            return Err(Error::InvalidResource("invalid resource start code".to_string()));
        }
        if self.compressed_size > self.uncompressed_size {
            return Err(Error::InvalidResource("compressed data is larger than uncompressed data".to_string()));
        }
        Ok(())
    }
    pub fn compression(&self) -> Option<Compression> {
        Compression::from_code(self.compression_code)
    }
    /// label for listings
    pub fn compression_type(&self) -> &'static str {
        match self.compression() {
            Some(c) => c.as_str(),
            None => "unknown compression"
        }
    }
    pub fn is_compressed(&self) -> bool {
        self.compression_code != Compression::None as u8
    }
    pub fn is_bitmap(&self) -> bool {
        check_flag(self.flags,FLAG_BITMAP)
    }
    pub fn is_rotated(&self) -> bool {
        check_flag(self.flags,FLAG_ROTATED)
    }
    pub fn uses_id_hash(&self) -> bool {
        check_flag(self.flags,FLAG_ID_HASH)
    }
}

#[test]
fn flags() {
    assert!(check_flag(0b0111,4));
    assert!(check_flag(0b0111,2));
    assert!(!check_flag(0b1011,4));
    assert!(check_flag(0b1011,3));
}

#[test]
fn extensions() {
    assert_eq!(Extension::from_name("BUYMORE.PCX"),Extension::Pcx);
    assert_eq!(Extension::from_name("intro.flc"),Extension::Flc);
    assert_eq!(Extension::from_name("WAV1209348.WAV"),Extension::Wav);
    assert_eq!(Extension::from_name("README.TXT"),Extension::Unknown);
    assert_eq!(Extension::from_name("NOEXT"),Extension::Unknown);
    assert_eq!(Extension::from_code(3),Some(Extension::Wav));
    assert_eq!(Extension::from_code(4),None);
    assert_eq!(Compression::from_code(2).map(|c| c.as_str()),Some("LZSS compressed"));
}

#[test]
fn record_layout() {
    let header = ResourceHeader {
        startcode: RESOURCE_START_CODE,
        chunk_size: SIZE_OF_RHEADER + 5,
        compressed_size: 5,
        uncompressed_size: 5,
        hash: 4127938,
        flags: FLAG_BITMAP,
        compression_code: 0,
        extension: Extension::Pcx as u8,
        filename: ResourceName::new("BUYMORE.PCX")
    };
    let mut buf = Vec::new();
    header.write(&mut buf).unwrap();
    assert_eq!(buf.len(),SIZE_OF_RHEADER as usize);
    assert_eq!(&buf[0..4],b"RSRC");
    assert_eq!(ResourceHeader::read(&mut buf.as_slice()).unwrap(),header);

    let entry = DirectoryEntry {
        hash: 1,
        offset: END_OF_HEADER,
        extension: 2,
        filename: ResourceName::new("FILENAME.FLC")
    };
    let mut buf = Vec::new();
    entry.write(&mut buf).unwrap();
    assert_eq!(buf.len(),SIZE_OF_DIRENTRY as usize);
    assert_eq!(hex::encode(&buf[0..9]),"010000000c00000002");
}
