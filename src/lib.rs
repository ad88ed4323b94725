//! # Birthright Resource Utility
//!
//! Library for the resource files of the game Birthright.  A resource file packs many named,
//! optionally compressed resources (PCX images, FLC animations, WAV sounds) which the game
//! finds by hashing the file name.
//!
//! * `archive` opens, lists, adds, removes, and extracts resources
//! * `lzss` is the compression used for payloads
//! * `pcx` converts PCX images to and from the game's intermediate bitmap
//! * `hash` computes the lookup keys
//!
//! ```
//! let mut resfile = brut::archive::ResourceFile::open(std::io::Cursor::new(Vec::new())).unwrap();
//! resfile.options_mut().compress = false;
//! resfile.add_data("FILENAME.FLC",&[]).unwrap();
//! assert_eq!(resfile.count(),1);
//! ```

pub mod hash;
pub mod lzss;
pub mod pcx;
pub mod name;
pub mod format;
pub mod archive;

pub use hash::HashScheme;
pub use name::ResourceName;
pub use archive::{ResourceFile,Listing,Storage};

pub type DYNERR = Box<dyn std::error::Error>;
pub type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Resource file errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("{0:#010x} is not a supported resource file version")]
    UnsupportedVersion(u32),
    #[error("offset is beyond the end of the resource file")]
    IndexOutOfRange,
    #[error("invalid resource: {0}")]
    InvalidResource(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("file size ({size}) is greater than max ({max})")]
    ResourceTooLarge {
        size: u64,
        max: u32
    },
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// Session settings, each open resource file carries its own copy
#[derive(Clone,Debug)]
pub struct Options {
    /// scheme used to hash names when adding, finding, or removing
    pub hash: HashScheme,
    /// try LZSS on new resources, kept only if smaller
    pub compress: bool,
    /// store PCX images rotated
    pub rotate: bool,
    /// give back PCX files rather than bitmaps when extracting
    pub restore: bool,
    /// largest payload that can be added
    pub max_resource_size: u32
}

pub const STD_OPTIONS: Options = Options {
    hash: HashScheme::Crc,
    compress: true,
    rotate: false,
    restore: false,
    max_resource_size: format::MAX_RESOURCE_SIZE
};

impl Default for Options {
    fn default() -> Self {
        STD_OPTIONS
    }
}
