//! PCX Images
//!
//! Images are not stored as PCX files.  They are expanded into an intermediate "bitmap",
//! a 10 byte header (width, height, scale, center point, type) followed by one byte per pixel.
//! Some images are stored rotated, i.e., transposed so that the pixels of each PCX row
//! become a column of the bitmap.
//!
//! PCX run length encoding: a byte with both upper bits set is a run marker, its lower 6 bits
//! give the count, and the next byte is the value to repeat.  Any other byte is a single pixel.
//!
//! Going back from a bitmap to a PCX is only supported for bitmaps that were not rotated.
//! Restored files always get the same fixed header and palettes.

use std::io::{Cursor,Seek,SeekFrom};
use byteorder::{LittleEndian,ReadBytesExt};
use crate::Error;

pub const BITMAP_HEADER_LEN: usize = 10;
const PCX_HEADER_LEN: usize = 128;
const BITMAP_SCALE: i16 = 5;
const BITMAP_CENTER_POINT: i16 = 0;
const BITMAP_TYPE: i16 = 0x000B;
const PCX_CODE: u32 = 0x0801050a; // manufacturer 10, version 5, RLE, 8 bits per pixel
const PCX_DPI: u32 = 0x01e00280; // 640 x 480
const PALETTE_SEPARATOR: u8 = 0x0C;
const MIN_RUN: usize = 2;
const MAX_RUN: usize = 63;

/// 16 color palette written into the PCX header (after 2 zero bytes)
const HEADER_PALETTE: [u8;46] = [
    0xFF, 0x0B, 0x0B, 0x0B, 0x13, 0x13, 0x13, 0x1B, 0x1B, 0x1B, 0x23, 0x23, 0x23, 0x2B, 0x2B, 0x2B,
    0x37, 0x37, 0x37, 0x3F, 0x3F, 0x3F, 0x47, 0x47, 0x47, 0x4F, 0x4F, 0x4F, 0x57, 0x57, 0x57, 0x63,
    0x63, 0x63, 0x6B, 0x6B, 0x6B, 0x73, 0x73, 0x73, 0x7B, 0x7B, 0x7B, 0x83, 0x83, 0x83
];

/// 256 color palette appended to restored PCX files
const VGA_PALETTE: [u8;768] = [
    0x00, 0x00, 0xFF, 0x0B, 0x0B, 0x0B, 0x13, 0x13, 0x13, 0x1B, 0x1B, 0x1B, 0x23, 0x23, 0x23, 0x2B,
    0x2B, 0x2B, 0x37, 0x37, 0x37, 0x3F, 0x3F, 0x3F, 0x47, 0x47, 0x47, 0x4F, 0x4F, 0x4F, 0x57, 0x57,
    0x57, 0x63, 0x63, 0x63, 0x6B, 0x6B, 0x6B, 0x73, 0x73, 0x73, 0x7B, 0x7B, 0x7B, 0x83, 0x83, 0x83,
    0x8F, 0x8F, 0x8F, 0x93, 0x93, 0x93, 0x9B, 0x9B, 0x9B, 0xA3, 0xA3, 0xA3, 0xAB, 0xAB, 0xAB, 0xB3,
    0xB3, 0xB3, 0xBB, 0xBB, 0xBB, 0xC3, 0xC3, 0xC3, 0xCB, 0xCB, 0xCB, 0xCF, 0xCF, 0xCF, 0xD7, 0xD7,
    0xD7, 0xDF, 0xDF, 0xDF, 0xE7, 0xE7, 0xE7, 0xEF, 0xEF, 0xEF, 0xF7, 0xF7, 0xF7, 0xFF, 0xFF, 0xFF,
    0x23, 0x1B, 0x2F, 0x27, 0x1F, 0x37, 0x2F, 0x27, 0x3F, 0x37, 0x2B, 0x47, 0x3F, 0x33, 0x53, 0x47,
    0x37, 0x5B, 0x4F, 0x3F, 0x63, 0x57, 0x47, 0x6B, 0x5F, 0x4B, 0x77, 0x67, 0x53, 0x7F, 0x6F, 0x5B,
    0x87, 0x77, 0x63, 0x93, 0x7F, 0x6B, 0x9B, 0x87, 0x73, 0xA3, 0x93, 0x7B, 0xAB, 0x9B, 0x83, 0xB7,
    0xA3, 0x8B, 0xBF, 0xAF, 0x93, 0xC7, 0xB7, 0x9B, 0xCF, 0xC3, 0xA3, 0xDB, 0xCF, 0xAB, 0xE3, 0xD7,
    0xB3, 0xEB, 0xE3, 0xBB, 0xF3, 0xEF, 0xC7, 0xFF, 0x17, 0x17, 0x3B, 0x1B, 0x1B, 0x47, 0x1F, 0x1F,
    0x57, 0x23, 0x23, 0x67, 0x2B, 0x27, 0x77, 0x2F, 0x2B, 0x83, 0x33, 0x2F, 0x93, 0x37, 0x33, 0xA3,
    0x3B, 0x37, 0xB3, 0x3F, 0x3B, 0xB7, 0x47, 0x43, 0xBB, 0x4F, 0x4B, 0xBF, 0x57, 0x53, 0xC7, 0x5F,
    0x5B, 0xCB, 0x67, 0x63, 0xCF, 0x6F, 0x6B, 0xD3, 0x77, 0x77, 0xDB, 0x7F, 0x7F, 0xDF, 0x8B, 0x8B,
    0xE3, 0x93, 0x93, 0xEB, 0x9F, 0x9F, 0xEF, 0xA7, 0xA7, 0xF3, 0xB3, 0xB3, 0xF7, 0xBF, 0xBF, 0xFF,
    0x2F, 0x0B, 0x3B, 0x37, 0x0B, 0x47, 0x43, 0x0F, 0x53, 0x4B, 0x13, 0x5F, 0x57, 0x13, 0x6F, 0x63,
    0x17, 0x7B, 0x6B, 0x17, 0x87, 0x77, 0x1B, 0x93, 0x83, 0x1F, 0xA3, 0x8B, 0x1F, 0xAF, 0x97, 0x23,
    0xBB, 0x9F, 0x23, 0xCB, 0xAB, 0x27, 0xD7, 0xB7, 0x2B, 0xE3, 0xBF, 0x2B, 0xEF, 0xCB, 0x2F, 0xFF,
    0xCB, 0x37, 0xFF, 0xCF, 0x43, 0xFF, 0xD3, 0x4B, 0xFF, 0xD7, 0x57, 0xFF, 0xDB, 0x5F, 0xFF, 0xDF,
    0x6B, 0xFF, 0xDF, 0x73, 0xFF, 0xE3, 0x7F, 0xFF, 0x3B, 0x0B, 0x0B, 0x47, 0x0B, 0x0B, 0x53, 0x0B,
    0x0B, 0x5F, 0x0F, 0x0F, 0x6B, 0x0F, 0x0F, 0x77, 0x0F, 0x0F, 0x83, 0x0F, 0x0F, 0x8F, 0x0F, 0x0F,
    0x97, 0x0F, 0x0F, 0xA3, 0x13, 0x13, 0xAF, 0x17, 0x17, 0xB7, 0x1B, 0x1B, 0xC3, 0x23, 0x23, 0xCB,
    0x27, 0x27, 0xD7, 0x2F, 0x2F, 0xDB, 0x33, 0x33, 0xDF, 0x37, 0x37, 0xE3, 0x3B, 0x3B, 0xE7, 0x43,
    0x43, 0xEB, 0x47, 0x47, 0xF3, 0x4F, 0x4F, 0xF7, 0x53, 0x53, 0xFB, 0x57, 0x57, 0xFF, 0x5F, 0x5F,
    0x2F, 0x17, 0x00, 0x3B, 0x1B, 0x00, 0x47, 0x23, 0x00, 0x53, 0x2B, 0x00, 0x63, 0x2F, 0x00, 0x6F,
    0x37, 0x00, 0x7B, 0x3B, 0x00, 0x87, 0x43, 0x00, 0x97, 0x4B, 0x00, 0xA3, 0x53, 0x00, 0xAF, 0x57,
    0x00, 0xBB, 0x5F, 0x07, 0xCB, 0x67, 0x07, 0xD7, 0x6B, 0x07, 0xE3, 0x73, 0x07, 0xEF, 0x7B, 0x07,
    0xFF, 0x83, 0x0B, 0xFF, 0x8F, 0x0B, 0xFF, 0x9B, 0x0F, 0xFF, 0xA7, 0x13, 0xFF, 0xB3, 0x13, 0xFF,
    0xBF, 0x17, 0xFF, 0xCB, 0x1B, 0xFF, 0xD7, 0x1F, 0x2F, 0x23, 0x0B, 0x37, 0x2B, 0x0B, 0x43, 0x33,
    0x0F, 0x4F, 0x3F, 0x13, 0x5B, 0x4B, 0x17, 0x67, 0x53, 0x17, 0x73, 0x5F, 0x1B, 0x7F, 0x6B, 0x1F,
    0x8B, 0x73, 0x23, 0x97, 0x7F, 0x23, 0xA3, 0x8B, 0x27, 0xAF, 0x93, 0x2B, 0xBB, 0x9F, 0x2F, 0xC7,
    0xAB, 0x33, 0xD3, 0xB7, 0x37, 0xDF, 0xC3, 0x3B, 0xE3, 0xCB, 0x3F, 0xEB, 0xD3, 0x47, 0xF3, 0xDF,
    0x4F, 0xF3, 0xE3, 0x63, 0xF7, 0xE7, 0x7B, 0xF7, 0xEB, 0x93, 0xFB, 0xEF, 0xAF, 0xFF, 0xF7, 0xC7,
    0x00, 0x23, 0x0B, 0x00, 0x2B, 0x0B, 0x00, 0x33, 0x0F, 0x00, 0x3B, 0x0F, 0x00, 0x43, 0x13, 0x00,
    0x4B, 0x13, 0x00, 0x53, 0x17, 0x00, 0x5B, 0x17, 0x00, 0x63, 0x1B, 0x00, 0x6B, 0x1B, 0x00, 0x73,
    0x1F, 0x00, 0x7B, 0x1F, 0x00, 0x7F, 0x1F, 0x00, 0x87, 0x1F, 0x00, 0x8F, 0x23, 0x00, 0x97, 0x23,
    0x07, 0x9F, 0x27, 0x0B, 0xAB, 0x2F, 0x13, 0xB7, 0x3B, 0x1B, 0xC3, 0x43, 0x27, 0xCB, 0x4B, 0x33,
    0xD7, 0x57, 0x3F, 0xE3, 0x63, 0x4B, 0xEF, 0x6F, 0x2F, 0x23, 0x17, 0x37, 0x27, 0x1B, 0x3F, 0x2F,
    0x1F, 0x47, 0x37, 0x23, 0x53, 0x3F, 0x27, 0x5B, 0x47, 0x2B, 0x63, 0x4F, 0x2F, 0x6B, 0x57, 0x37,
    0x77, 0x5F, 0x3B, 0x7F, 0x63, 0x3F, 0x83, 0x6B, 0x43, 0x8B, 0x73, 0x47, 0x93, 0x7B, 0x4F, 0x9B,
    0x7F, 0x53, 0xA3, 0x87, 0x57, 0xAB, 0x8F, 0x5B, 0xB3, 0x97, 0x63, 0xBB, 0x9F, 0x67, 0xC3, 0xA7,
    0x6F, 0xCB, 0xB3, 0x77, 0xD7, 0xBB, 0x7F, 0xDF, 0xC7, 0x87, 0xE7, 0xCF, 0x8F, 0xF3, 0xDB, 0x97,
    0x2F, 0x1F, 0x1B, 0x37, 0x23, 0x1F, 0x43, 0x2B, 0x23, 0x4B, 0x2F, 0x27, 0x57, 0x37, 0x2B, 0x5F,
    0x3F, 0x2F, 0x6B, 0x43, 0x33, 0x77, 0x4B, 0x37, 0x7F, 0x4F, 0x3B, 0x87, 0x53, 0x3F, 0x8F, 0x5B,
    0x43, 0x9B, 0x5F, 0x47, 0xA3, 0x63, 0x4B, 0xAB, 0x6B, 0x4F, 0xB3, 0x6F, 0x53, 0xBB, 0x73, 0x57,
    0xC7, 0x7B, 0x5F, 0xCF, 0x87, 0x67, 0xD7, 0x8F, 0x6F, 0xE3, 0x9B, 0x77, 0xEB, 0xA3, 0x7F, 0xF3,
    0xAF, 0x87, 0xFF, 0xBB, 0x93, 0xFF, 0xC3, 0x97, 0xEB, 0x87, 0x00, 0xEF, 0xA3, 0x00, 0xF7, 0xC3,
    0x00, 0xFF, 0xE3, 0x00, 0xFF, 0xFF, 0x00, 0xFB, 0xFF, 0x7F, 0xFF, 0xFF, 0xD3, 0xFF, 0xFF, 0xFF
];

fn bad_image(msg: &str) -> Error {
    Error::InvalidImage(msg.to_string())
}

/// The PCX header fields we use, width and height are already adjusted
/// from the stored maximum coordinates.
#[derive(Clone,Debug,PartialEq)]
pub struct PcxHeader {
    pub code: u32,
    pub x_origin: i16,
    pub y_origin: i16,
    pub width: i16,
    pub height: i16,
    pub line_length: u16
}

/// Header of the intermediate bitmap
#[derive(Clone,Debug,PartialEq)]
pub struct BitmapHeader {
    pub width: i16,
    pub height: u16,
    pub scale: i16,
    pub center_point: i16,
    pub kind: i16
}

impl PcxHeader {
    pub fn read(pcx: &[u8]) -> Result<Self,Error> {
        if pcx.len() < PCX_HEADER_LEN {
            return Err(bad_image("PCX header is truncated"));
        }
        let mut rdr = Cursor::new(pcx);
        let code = rdr.read_u32::<LittleEndian>()?;
        let x_origin = rdr.read_i16::<LittleEndian>()?;
        let y_origin = rdr.read_i16::<LittleEndian>()?;
        let x_max = rdr.read_i16::<LittleEndian>()?;
        let y_max = rdr.read_i16::<LittleEndian>()?;
        rdr.seek(SeekFrom::Start(66))?;
        let line_length = rdr.read_u16::<LittleEndian>()?;
        let width = x_max.wrapping_sub(x_origin).wrapping_add(1);
        let height = y_max.wrapping_sub(y_origin).wrapping_add(1);
        if width < 0 || height < 0 {
            return Err(bad_image("PCX dimensions are negative"));
        }
        Ok(Self {
            code,
            x_origin,
            y_origin,
            width,
            height,
            line_length
        })
    }
    /// Fixed 128 byte header, only the dimensions vary
    fn to_bytes(&self) -> Vec<u8> {
        let mut ans = Vec::with_capacity(PCX_HEADER_LEN);
        ans.extend_from_slice(&PCX_CODE.to_le_bytes());
        ans.extend_from_slice(&self.x_origin.to_le_bytes());
        ans.extend_from_slice(&self.y_origin.to_le_bytes());
        ans.extend_from_slice(&(self.width - 1).to_le_bytes());
        ans.extend_from_slice(&(self.height - 1).to_le_bytes());
        ans.extend_from_slice(&PCX_DPI.to_le_bytes());
        ans.extend_from_slice(&[0,0]);
        ans.extend_from_slice(&HEADER_PALETTE);
        ans.push(0); // reserved
        ans.push(1); // planes
        ans.extend_from_slice(&self.line_length.to_le_bytes());
        ans.resize(PCX_HEADER_LEN,0);
        ans
    }
}

impl BitmapHeader {
    fn new(width: i16,height: u16) -> Self {
        Self {
            width,
            height,
            scale: BITMAP_SCALE,
            center_point: BITMAP_CENTER_POINT,
            kind: BITMAP_TYPE
        }
    }
    pub fn read(bitmap: &[u8]) -> Result<Self,Error> {
        if bitmap.len() < BITMAP_HEADER_LEN {
            return Err(bad_image("bitmap header is truncated"));
        }
        let mut rdr = Cursor::new(bitmap);
        Ok(Self {
            width: rdr.read_i16::<LittleEndian>()?,
            height: rdr.read_u16::<LittleEndian>()?,
            scale: rdr.read_i16::<LittleEndian>()?,
            center_point: rdr.read_i16::<LittleEndian>()?,
            kind: rdr.read_i16::<LittleEndian>()?
        })
    }
    fn write(&self,buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.width.to_le_bytes());
        buf[2..4].copy_from_slice(&self.height.to_le_bytes());
        buf[4..6].copy_from_slice(&self.scale.to_le_bytes());
        buf[6..8].copy_from_slice(&self.center_point.to_le_bytes());
        buf[8..10].copy_from_slice(&self.kind.to_le_bytes());
    }
}

/// Iterates over the run length tokens of the pixel data
struct RleReader<'a> {
    data: &'a [u8],
    ptr: usize
}

impl<'a> RleReader<'a> {
    fn new(pcx: &'a [u8]) -> Self {
        Self {
            data: pcx,
            ptr: PCX_HEADER_LEN
        }
    }
    /// returns (count,value)
    fn next_token(&mut self) -> Result<(usize,u8),Error> {
        let by = *self.data.get(self.ptr).ok_or_else(|| bad_image("PCX pixel data ended early"))?;
        self.ptr += 1;
        if by & 0xc0 != 0xc0 {
            return Ok((1,by));
        }
        let value = *self.data.get(self.ptr).ok_or_else(|| bad_image("PCX run is missing its value"))?;
        self.ptr += 1;
        Ok(((by & 0x3f) as usize,value))
    }
}

/// Expand PCX pixels row by row into a `line_length` x `height` bitmap.
/// Columns past the image width are zeroed.
pub fn decompress(pcx: &[u8]) -> Result<Vec<u8>,Error> {
    let header = PcxHeader::read(pcx)?;
    let line_length = header.line_length as usize;
    let height = header.height as usize;
    let width = header.width as usize;
    let expanded_length = line_length * height;
    let mut ans = vec![0;BITMAP_HEADER_LEN + expanded_length];
    let mut rle = RleReader::new(pcx);
    let mut l = 0;
    while l < expanded_length {
        let (count,value) = rle.next_token()?;
        for _i in 0..count {
            if l < expanded_length {
                ans[BITMAP_HEADER_LEN + l] = value;
            }
            l += 1;
        }
    }
    if width < line_length {
        for row in 0..height {
            let start = BITMAP_HEADER_LEN + row * line_length;
            ans[start+width..start+line_length].fill(0);
        }
    }
    BitmapHeader::new(header.line_length as i16,header.height as u16).write(&mut ans);
    log::debug!("PCX {}x{} expanded to {} bytes",width,height,ans.len());
    Ok(ans)
}

/// Expand PCX pixels transposed: pixel (row,col) lands at `col * height + row`.
/// The bitmap is `height` wide and `line_length` tall.
pub fn rotate(pcx: &[u8]) -> Result<Vec<u8>,Error> {
    let header = PcxHeader::read(pcx)?;
    let line_length = header.line_length as usize;
    let height = header.height as usize;
    let width = header.width as usize;
    let mut ans = vec![0;BITMAP_HEADER_LEN + line_length * height];
    let mut rle = RleReader::new(pcx);
    for row in 0..height {
        let loc = BITMAP_HEADER_LEN + row;
        let mut col = 0;
        while col < line_length {
            let (count,value) = rle.next_token()?;
            for _i in 0..count {
                // a run may not carry into the next row
                if col < line_length {
                    ans[loc + col * height] = value;
                }
                col += 1;
            }
        }
        for col in usize::min(width,line_length)..line_length {
            ans[loc + col * height] = 0;
        }
    }
    BitmapHeader::new(header.height,header.line_length).write(&mut ans);
    log::debug!("PCX {}x{} rotated to {} bytes",width,height,ans.len());
    Ok(ans)
}

/// Convert PCX file data to the intermediate bitmap
pub fn to_bitmap(pcx: &[u8],rotated: bool) -> Result<Vec<u8>,Error> {
    match rotated {
        true => rotate(pcx),
        false => decompress(pcx)
    }
}

/// Re-encode a non-rotated bitmap as a PCX file.  If every row ends in a zero,
/// that column is taken to be padding and the image width is reduced by one.
pub fn recompress(bitmap: &[u8]) -> Result<Vec<u8>,Error> {
    let bmp_header = BitmapHeader::read(bitmap)?;
    if bmp_header.width <= 0 {
        return Err(bad_image("bitmap has no width"));
    }
    let height = i16::try_from(bmp_header.height).map_err(|_| bad_image("bitmap is too tall for PCX"))?;
    let line_length = bmp_header.width as usize;
    let pixels = &bitmap[BITMAP_HEADER_LEN..];
    let mut pcx_header = PcxHeader {
        code: PCX_CODE,
        x_origin: 0,
        y_origin: 0,
        width: bmp_header.width,
        height,
        line_length: line_length as u16
    };
    let rows = bmp_header.height as usize;
    let short_width = rows > 0 && (0..rows).all(|i| pixels.get(i * line_length + line_length - 1) == Some(&0));
    if short_width {
        pcx_header.width -= 1;
    }

    let mut ans = pcx_header.to_bytes();
    let mut i = 0;
    while i < pixels.len() {
        let start = pixels[i];
        let mut count = 1;
        while i + count < pixels.len()
            && (i + count) % line_length != 0
            && pixels[i + count] == start
            && count < MAX_RUN {
            count += 1;
        }
        if count < MIN_RUN {
            count = 1;
        }
        // a lone value with both upper bits set would read as a run marker
        if count == 1 && start < 0xc0 {
            ans.push(start);
        } else {
            ans.push(0xc0 + count as u8);
            ans.push(start);
        }
        i += count;
    }
    ans.push(PALETTE_SEPARATOR);
    ans.extend_from_slice(&VGA_PALETTE);
    log::debug!("bitmap {}x{} restored to PCX of {} bytes",pcx_header.width,rows,ans.len());
    Ok(ans)
}

#[cfg(test)]
pub(crate) fn test_pcx(x_max: i16,y_max: i16,line_length: u16,pixels: &[u8]) -> Vec<u8> {
    let mut ans = vec![0;PCX_HEADER_LEN];
    ans[0..4].copy_from_slice(&PCX_CODE.to_le_bytes());
    ans[8..10].copy_from_slice(&x_max.to_le_bytes());
    ans[10..12].copy_from_slice(&y_max.to_le_bytes());
    ans[66..68].copy_from_slice(&line_length.to_le_bytes());
    ans.extend_from_slice(pixels);
    ans
}

#[test]
fn decompress_works() {
    // 3x2 image with 4 byte lines, second row is a run
    let pcx = test_pcx(2,1,4,&[1,2,3,0x77,0xc3,5,0]);
    let bitmap = decompress(&pcx).expect("decompress failed");
    assert_eq!(bitmap,hex::decode("04000200050000000B000102030005050500").unwrap());
    assert_eq!(bitmap.len(),BITMAP_HEADER_LEN + 4 * 2);
    assert_eq!(decompress(&pcx).unwrap(),bitmap);
}

#[test]
fn rotate_works() {
    let pcx = test_pcx(2,1,4,&[1,2,3,0x77,0xc3,5,0]);
    let bitmap = rotate(&pcx).expect("rotate failed");
    let header = BitmapHeader::read(&bitmap).unwrap();
    assert_eq!((header.width,header.height),(2,4));
    assert_eq!(bitmap[BITMAP_HEADER_LEN..].to_vec(),vec![1,5,2,5,3,5,0,0]);
}

#[test]
fn truncated_pixels() {
    let pcx = test_pcx(2,1,4,&[1,2,3,0,0xc3]);
    assert!(matches!(decompress(&pcx),Err(Error::InvalidImage(_))));
    assert!(matches!(decompress(&pcx[0..100]),Err(Error::InvalidImage(_))));
}

#[test]
fn recompress_works() {
    let pcx = test_pcx(2,1,4,&[1,2,3,0,0xc3,5,0]);
    let bitmap = decompress(&pcx).unwrap();
    let restored = recompress(&bitmap).expect("recompress failed");
    assert_eq!(restored.len(),PCX_HEADER_LEN + 7 + 1 + 768);
    assert_eq!(restored[PCX_HEADER_LEN..PCX_HEADER_LEN+8].to_vec(),vec![1,2,3,0,0xc3,5,0,PALETTE_SEPARATOR]);
    let header = PcxHeader::read(&restored).unwrap();
    assert_eq!((header.width,header.height,header.line_length),(3,2,4));
    assert_eq!(decompress(&restored).unwrap(),bitmap);
}

#[test]
fn recompress_high_values() {
    // values 0xc0 and up cannot be literals, runs stop at the row boundary
    let mut bitmap = vec![0;BITMAP_HEADER_LEN];
    BitmapHeader::new(3,2).write(&mut bitmap);
    bitmap.extend_from_slice(&[0xc8,7,7,7,9,9]);
    let restored = recompress(&bitmap).unwrap();
    assert_eq!(restored[PCX_HEADER_LEN..PCX_HEADER_LEN+7].to_vec(),vec![0xc1,0xc8,0xc2,7,7,0xc2,9]);
    let header = PcxHeader::read(&restored).unwrap();
    assert_eq!((header.width,header.height,header.line_length),(3,2,3));
}

#[test]
fn long_runs_split() {
    let mut bitmap = vec![0;BITMAP_HEADER_LEN];
    BitmapHeader::new(100,1).write(&mut bitmap);
    bitmap.extend_from_slice(&[4;100]);
    let restored = recompress(&bitmap).unwrap();
    assert_eq!(restored[PCX_HEADER_LEN..PCX_HEADER_LEN+4].to_vec(),vec![0xff,4,0xc0+37,4]);
    assert_eq!(decompress(&restored).unwrap(),bitmap);
}

#[test]
fn recompress_too_tall() {
    let mut bitmap = vec![0;BITMAP_HEADER_LEN];
    BitmapHeader::new(1,0x8000).write(&mut bitmap);
    bitmap.extend_from_slice(&[1,2,3,4]);
    assert!(matches!(recompress(&bitmap),Err(Error::InvalidImage(_))));
    BitmapHeader::new(1,0x7fff).write(&mut bitmap);
    assert!(recompress(&bitmap).is_ok());
}
