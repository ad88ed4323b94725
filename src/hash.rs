//! Resource Hashes
//!
//! Resources are located by a 32 bit key computed from the file name, never by the
//! name itself.  Two schemes exist:
//!
//! * CRC scheme, a checksum of the upper case name including the extension and a trailing NUL.
//!   The low word is a CRC-16 (polynomial 0x1021) fed 6 bits per character, the high word
//!   is the XOR of all the characters.
//! * ID scheme, the first run of decimal digits in the name read as a base 10 number.
//!
//! Both schemes see only the last path component.  Names that hash equal are indistinguishable.

/// Selects how names are turned into lookup keys
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum HashScheme {
    Crc,
    Id
}

/// strip any path components, either separator is accepted
fn base_name(filename: &str) -> &str {
    match filename.rfind(|c| c=='\\' || c=='/') {
        Some(idx) => &filename[idx+1..],
        None => filename
    }
}

/// CRC style hash of the file name, case insensitive for A-Z.
pub fn hash_crc(filename: &str) -> u32 {
    let name = base_name(filename);
    let mut accum_crc: u32 = 0;
    let mut accum_xor: u32 = 0;
    // the terminating NUL is part of the hash
    for c in name.bytes().chain(std::iter::once(0)) {
        let c = c.to_ascii_uppercase() as u32;
        accum_xor ^= c;
        accum_crc = (accum_crc << 6).wrapping_add(c.wrapping_sub(b' ' as u32) & 63);
        for i in (0..6).rev() {
            if accum_crc & (1 << (16 + i)) != 0 {
                accum_crc ^= 0x1021 << i;
            }
        }
    }
    let ans = (accum_xor << 16) | (accum_crc & 0xffff);
    log::trace!("CRC hash of {} is {:08X}",name,ans);
    ans
}

/// ID hash, the first run of digits in the file name.
/// Leading non-digits are skipped, the first non-digit after the run ends it.
pub fn hash_id(filename: &str) -> u32 {
    let name = base_name(filename);
    let mut ans: u32 = 0;
    let mut found_digit = false;
    for c in name.chars() {
        match c.to_digit(10) {
            Some(d) => {
                found_digit = true;
                ans = ans.wrapping_mul(10).wrapping_add(d);
            },
            None if found_digit => break,
            None => {}
        }
    }
    log::trace!("ID hash of {} is {}",name,ans);
    ans
}

impl HashScheme {
    pub fn hash(&self,filename: &str) -> u32 {
        match self {
            HashScheme::Crc => hash_crc(filename),
            HashScheme::Id => hash_id(filename)
        }
    }
}

#[test]
fn crc_hash() {
    assert_eq!(hash_crc("BUYMORE.PCX"),4127938);
    assert_eq!(hash_crc("buymore.pcx"),4127938);
    assert_eq!(hash_crc("FILENAME.FLC"),6715995);
}

#[test]
fn crc_hash_ignores_path() {
    assert_eq!(hash_crc("C:\\GAME\\ART\\buymore.pcx"),4127938);
    assert_eq!(hash_crc("art/BUYMORE.PCX"),4127938);
}

#[test]
fn id_hash() {
    assert_eq!(hash_id("WAV1209348.WAV"),1209348);
    assert_eq!(hash_id("WAV120934B8.WAV"),120934);
    assert_eq!(hash_id("SOUNDS\\WAV42.WAV"),42);
    assert_eq!(hash_id("NODIGITS.WAV"),0);
}

#[test]
fn scheme_dispatch() {
    assert_eq!(HashScheme::Crc.hash("BUYMORE.PCX"),4127938);
    assert_eq!(HashScheme::Id.hash("WAV1209348.WAV"),1209348);
}
