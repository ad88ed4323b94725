//! Resource Names
//!
//! Names are stored in a fixed 13 byte field, NUL padded, with no terminator when the
//! name fills the field.  Longer names are truncated when written, padding is trimmed
//! when read back.

use std::fmt;

pub const MAX_RESOURCE_NAME: usize = 13;

/// Fixed width name as it appears in resource and directory headers
#[derive(Clone,Copy,PartialEq,Eq,Hash,Default)]
pub struct ResourceName([u8;MAX_RESOURCE_NAME]);

impl ResourceName {
    /// Truncate or pad `name` to the field width, no case conversion
    pub fn new(name: &str) -> Self {
        let mut ans = [0;MAX_RESOURCE_NAME];
        let bytes = name.as_bytes();
        let n = usize::min(bytes.len(),MAX_RESOURCE_NAME);
        ans[0..n].copy_from_slice(&bytes[0..n]);
        Self(ans)
    }
    /// Canonical form used when adding a file: last path component, A-Z upper case
    pub fn canonical(path: &str) -> Self {
        let base = match path.rfind(|c| c=='\\' || c=='/') {
            Some(idx) => &path[idx+1..],
            None => path
        };
        Self::new(&base.to_ascii_uppercase())
    }
    pub fn from_bytes(bytes: [u8;MAX_RESOURCE_NAME]) -> Self {
        Self(bytes)
    }
    pub fn as_bytes(&self) -> &[u8;MAX_RESOURCE_NAME] {
        &self.0
    }
    /// The name with all NUL bytes removed
    pub fn to_string_lossy(&self) -> String {
        let trimmed: Vec<u8> = self.0.iter().copied().filter(|c| *c != 0).collect();
        String::from_utf8_lossy(&trimmed).into_owned()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_string_lossy())
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"ResourceName({:?})",self.to_string_lossy())
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[test]
fn pad_and_trim() {
    let short = ResourceName::new("Rez");
    assert_eq!(short.as_bytes(),b"Rez\0\0\0\0\0\0\0\0\0\0");
    assert_eq!(short.to_string_lossy(),"Rez");
    let long = ResourceName::new("ResourceUtility");
    assert_eq!(long.as_bytes(),b"ResourceUtili");
    assert_eq!(long.to_string(),"ResourceUtili");
}

#[test]
fn canonical_form() {
    assert_eq!(ResourceName::canonical("art/buymore.pcx").to_string(),"BUYMORE.PCX");
    assert_eq!(ResourceName::canonical("C:\\RES\\wav1209348.wav").to_string(),"WAV1209348.WA");
    assert_eq!(format!("{:12}|",ResourceName::new("A.WAV")),"A.WAV       |");
}
