//! Resource Files
//!
//! A resource file is laid out as
//! * 12 byte file header
//! * resource chunks, each a 36 byte resource header followed by the payload,
//!   chained by the chunk size
//! * directory, one 22 byte entry per resource, starting at the directory offset
//!
//! The directory serves fast listings.  Lookups by name walk the chunks from the start
//! and take the first chunk whose hash matches, so two names with the same hash cannot
//! both be reached.
//!
//! Adding a resource overwrites the directory, which has to be saved again afterwards
//! (`add_files` and `save` do this).  Removing resources compacts the chunks in place and
//! truncates the file.  Nothing is journaled, a crash in the middle of a removal can leave
//! a directory that disagrees with the chunks.

use std::collections::HashMap;
use std::io::{Cursor,Read,Write,Seek,SeekFrom};
use std::path::{Path,PathBuf};
use crate::format::*;
use crate::name::ResourceName;
use crate::{Error,Options,HashScheme,STD_OPTIONS,lzss,pcx};

/// Backing stream of a resource file, removal needs to shorten it
pub trait Storage: Read + Write + Seek {
    fn set_len(&mut self,len: u64) -> std::io::Result<()>;
}

impl Storage for std::fs::File {
    fn set_len(&mut self,len: u64) -> std::io::Result<()> {
        std::fs::File::set_len(self,len)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn set_len(&mut self,len: u64) -> std::io::Result<()> {
        self.get_mut().resize(len as usize,0);
        Ok(())
    }
}

/// One line of a listing
#[derive(Debug)]
pub enum Listing {
    /// fast listing, straight from the directory
    Entry {
        name: ResourceName,
        offset: u32
    },
    /// verified listing, the resource header passed its checks
    Resource(ResourceHeader),
    /// verified listing, the resource header at this position is damaged
    Invalid {
        index: usize,
        error: Error
    }
}

impl Listing {
    pub fn name(&self) -> String {
        match self {
            Self::Entry { name, .. } => name.to_string(),
            Self::Resource(header) => header.filename.to_string(),
            Self::Invalid { index, .. } => format!("Item {} is invalid",index)
        }
    }
}

fn read_fault(e: std::io::Error) -> Error {
    Error::InvalidResource(format!("a data read exception occurred: {}",e))
}

fn base_name(path: &str) -> &str {
    match path.rfind(|c| c=='\\' || c=='/') {
        Some(idx) => &path[idx+1..],
        None => path
    }
}

/// Match a file name against a pattern with `*` and `?`, ignoring case
fn wildcard_match(pattern: &str,name: &str) -> bool {
    let p: Vec<char> = pattern.to_ascii_uppercase().chars().collect();
    let n: Vec<char> = name.to_ascii_uppercase().chars().collect();
    let (mut pi,mut ni) = (0,0);
    let mut star: Option<(usize,usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi]=='?' || p[pi]==n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi]=='*' {
            star = Some((pi,ni));
            pi += 1;
        } else if let Some((sp,sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp,sn + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi]=='*' {
        pi += 1;
    }
    pi == p.len()
}

/// Files in the pattern's directory whose names match its last component, sorted by name.
/// Subdirectories are not searched.
fn resolve_pattern(pattern: &str) -> Vec<PathBuf> {
    let path = Path::new(pattern);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from(".")
    };
    let file_pattern = match path.file_name() {
        Some(f) => f.to_string_lossy().to_string(),
        None => return Vec::new()
    };
    walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| wildcard_match(&file_pattern,&entry.file_name().to_string_lossy()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Write an extracted payload as `dir/<name>`, only the last component of the name is used
fn save_resource(name: &ResourceName,data: &[u8],dir: &Path) -> Result<PathBuf,Error> {
    let name = name.to_string();
    let base = base_name(&name);
    if base.is_empty() || base==".." || base=="." {
        return Err(Error::InvalidResource(format!("cannot extract to name {}",name)));
    }
    let path = dir.join(base);
    std::fs::write(&path,data)?;
    log::debug!("extracted {} bytes to {}",data.len(),path.display());
    Ok(path)
}

/// An open resource file.  The file header and directory are held in memory,
/// resource headers are read from the stream each time they are needed.
pub struct ResourceFile<S: Storage> {
    stream: S,
    header: FileHeader,
    directory: Vec<DirectoryEntry>,
    opt: Options
}

impl ResourceFile<std::fs::File> {
    /// Open the resource file at `path`, creating an empty one if needed
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self,Error> {
        let file = std::fs::OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path.as_ref())?;
        Self::open(file)
    }
}

impl<S: Storage> ResourceFile<S> {
    /// Open a resource file with default settings, an empty stream is a new resource file
    pub fn open(stream: S) -> Result<Self,Error> {
        Self::open_with(stream,STD_OPTIONS)
    }
    pub fn open_with(stream: S,opt: Options) -> Result<Self,Error> {
        let mut ans = Self {
            stream,
            header: FileHeader::new(),
            directory: Vec::new(),
            opt
        };
        if ans.stream_len().map_err(read_fault)? > 0 {
            ans.load_file_header()?;
            ans.load_directory()?;
        }
        log::debug!("opened resource file with {} resources",ans.header.resource_count);
        Ok(ans)
    }
    /// Give back the stream, e.g. to inspect an in-memory resource file
    pub fn into_inner(self) -> S {
        self.stream
    }
    pub fn options(&self) -> &Options {
        &self.opt
    }
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.opt
    }
    pub fn hash_scheme(&self) -> HashScheme {
        self.opt.hash
    }
    /// major version, i.e., 4 for the supported version
    pub fn file_version(&self) -> u32 {
        self.header.version >> 8
    }
    pub fn count(&self) -> u32 {
        self.header.resource_count
    }
    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }
    fn stream_len(&mut self) -> std::io::Result<u64> {
        self.stream.seek(SeekFrom::End(0))
    }
    fn hash(&self,name: &str) -> u32 {
        self.opt.hash.hash(name)
    }

    /// Read the file header and check the version and directory offset
    pub fn load_file_header(&mut self) -> Result<(),Error> {
        let len = self.stream_len().map_err(read_fault)?;
        self.stream.seek(SeekFrom::Start(0)).map_err(read_fault)?;
        let header = FileHeader::read(&mut self.stream).map_err(read_fault)?;
        if header.version != RESUTIL_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }
        if header.directory_offset as u64 > len {
            return Err(Error::IndexOutOfRange);
        }
        self.header = header;
        Ok(())
    }
    pub fn save_file_header(&mut self) -> Result<(),Error> {
        self.stream.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.stream)?;
        self.stream.flush()?;
        Ok(())
    }
    /// Read the directory, every entry must point inside the file
    pub fn load_directory(&mut self) -> Result<(),Error> {
        let len = self.stream_len().map_err(read_fault)?;
        self.stream.seek(SeekFrom::Start(self.header.directory_offset as u64)).map_err(read_fault)?;
        let mut directory = Vec::new();
        for _i in 0..self.header.resource_count {
            let entry = DirectoryEntry::read(&mut self.stream).map_err(read_fault)?;
            if entry.offset as u64 > len {
                return Err(Error::IndexOutOfRange);
            }
            directory.push(entry);
        }
        self.directory = directory;
        Ok(())
    }
    pub fn save_directory(&mut self) -> Result<(),Error> {
        self.stream.seek(SeekFrom::Start(self.header.directory_offset as u64))?;
        for entry in &self.directory {
            entry.write(&mut self.stream)?;
        }
        self.stream.flush()?;
        Ok(())
    }
    /// Write both the file header and the directory
    pub fn save(&mut self) -> Result<(),Error> {
        self.save_file_header()?;
        self.save_directory()
    }

    /// Read a resource header without checking it, the stream is left at the payload
    fn read_resource_header(&mut self,offset: u64) -> Result<ResourceHeader,Error> {
        self.stream.seek(SeekFrom::Start(offset)).map_err(read_fault)?;
        ResourceHeader::read(&mut self.stream).map_err(read_fault)
    }
    /// Read and check the resource header at `offset`, the stream is left at the payload
    pub fn load_resource_header(&mut self,offset: u32) -> Result<ResourceHeader,Error> {
        let header = self.read_resource_header(offset as u64)?;
        header.validate()?;
        Ok(header)
    }
    pub fn save_resource_header(&mut self,header: &ResourceHeader,offset: u32) -> Result<(),Error> {
        self.stream.seek(SeekFrom::Start(offset as u64))?;
        header.write(&mut self.stream)?;
        Ok(())
    }

    /// List the resources.  The fast listing reports the directory.  The verified listing
    /// walks the chunks and reads every resource header, a damaged header is reported
    /// and the walk goes on using whatever chunk size was read.
    pub fn list_contents(&mut self,verify: bool) -> Vec<Listing> {
        if !verify {
            return self.directory.iter().map(|entry| Listing::Entry {
                name: entry.filename,
                offset: entry.offset
            }).collect();
        }
        if self.header.version != RESUTIL_VERSION {
            return Vec::new();
        }
        let mut ans = Vec::new();
        let mut position = END_OF_HEADER as u64;
        for index in 0..self.header.resource_count as usize {
            let item = match self.read_resource_header(position) {
                Ok(header) => {
                    position += header.chunk_size as u64;
                    match header.validate() {
                        Ok(()) => Listing::Resource(header),
                        Err(error) => Listing::Invalid { index, error }
                    }
                },
                Err(error) => Listing::Invalid { index, error }
            };
            if let Listing::Invalid { error, .. } = &item {
                log::warn!("resource {} is invalid: {}",index,error);
            }
            ans.push(item);
        }
        ans
    }

    /// Walk the chunks for the first resource with this hash, returns (offset,header)
    fn locate(&mut self,hash: u32,name: &str) -> Result<(u32,ResourceHeader),Error> {
        let mut position = END_OF_HEADER;
        for _i in 0..self.header.resource_count {
            if position >= self.header.directory_offset {
                break;
            }
            let header = self.load_resource_header(position)?;
            if header.hash == hash {
                return Ok((position,header));
            }
            position = position.saturating_add(header.chunk_size);
        }
        Err(Error::FileNotFound(name.to_string()))
    }
    /// Resource header for the named file
    pub fn get_file_information(&mut self,name: &str) -> Result<ResourceHeader,Error> {
        let hash = self.hash(name);
        Ok(self.locate(hash,name)?.1)
    }
    /// Offset of the named file's resource header
    pub fn get_file_offset(&mut self,name: &str) -> Result<u32,Error> {
        let hash = self.hash(name);
        Ok(self.locate(hash,name)?.0)
    }

    /// Append a payload at the directory offset and add its directory entry.
    /// The directory and file header are not saved.
    fn append_resource(&mut self,header: &ResourceHeader,data: &[u8]) -> Result<(),Error> {
        let offset = self.header.directory_offset;
        let new_directory_offset = offset.checked_add(header.chunk_size).ok_or(Error::ResourceTooLarge {
            size: offset as u64 + header.chunk_size as u64,
            max: u32::MAX
        })?;
        self.save_resource_header(header,offset)?;
        self.stream.write_all(data)?;
        self.stream.flush()?;
        self.directory.push(DirectoryEntry {
            hash: header.hash,
            offset,
            extension: header.extension,
            filename: header.filename
        });
        self.header.resource_count += 1;
        self.header.directory_offset = new_directory_offset;
        log::debug!("added {} at {} with chunk size {}",header.filename,offset,header.chunk_size);
        Ok(())
    }
    /// Add a resource from memory, `name` supplies the stored name, hash, and extension.
    /// PCX images are converted to bitmaps, then the payload is compressed if that helps.
    pub fn add_data(&mut self,name: &str,data: &[u8]) -> Result<ResourceHeader,Error> {
        let filename = base_name(name).to_ascii_uppercase();
        if data.len() as u64 > self.opt.max_resource_size as u64 {
            return Err(Error::ResourceTooLarge { size: data.len() as u64, max: self.opt.max_resource_size });
        }
        let extension = Extension::from_name(&filename);
        let mut header = ResourceHeader {
            startcode: RESOURCE_START_CODE,
            hash: self.hash(&filename),
            extension: extension as u8,
            filename: ResourceName::canonical(name),
            ..Default::default()
        };
        if self.opt.hash == HashScheme::Id {
            header.flags |= FLAG_ID_HASH;
        }
        let payload = match extension {
            Extension::Pcx => {
                header.flags |= FLAG_BITMAP;
                if self.opt.rotate {
                    header.flags |= FLAG_ROTATED;
                }
                pcx::to_bitmap(data,self.opt.rotate)?
            },
            _ => data.to_vec()
        };
        header.uncompressed_size = u32::try_from(payload.len()).map_err(|_| Error::ResourceTooLarge {
            size: payload.len() as u64,
            max: u32::MAX
        })?;
        let compressed = match self.opt.compress {
            true => lzss::encode(&payload),
            false => Vec::new()
        };
        let stored = if !self.opt.compress || compressed.len() >= payload.len() {
            header.compression_code = Compression::None as u8;
            header.compressed_size = header.uncompressed_size;
            payload
        } else {
            header.compression_code = Compression::Lzss as u8;
            header.compressed_size = compressed.len() as u32;
            compressed
        };
        header.chunk_size = SIZE_OF_RHEADER.checked_add(header.compressed_size).ok_or(Error::ResourceTooLarge {
            size: stored.len() as u64,
            max: u32::MAX - SIZE_OF_RHEADER
        })?;
        self.append_resource(&header,&stored)?;
        Ok(header)
    }
    /// Add a file from disk, see `add_data`
    pub fn add_file<P: AsRef<Path>>(&mut self,path: P) -> Result<ResourceHeader,Error> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) if e.kind()==std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.display().to_string()));
            },
            Err(e) => return Err(Error::Io(e))
        };
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => return Err(Error::FileNotFound(path.display().to_string()))
        };
        self.add_data(&name,&data)
    }
    /// Add every file matching the pattern, e.g. `art/*.PCX`, then save the
    /// file header and directory.
    pub fn add_files(&mut self,pattern: &str) -> Result<Vec<ResourceHeader>,Error> {
        let paths = resolve_pattern(pattern);
        if paths.is_empty() {
            return Err(Error::FileNotFound(pattern.to_string()));
        }
        let mut ans = Vec::new();
        for path in paths {
            ans.push(self.add_file(&path)?);
        }
        self.save()?;
        Ok(ans)
    }

    /// Remove resources by name.  Every name is checked before anything is written, if one
    /// is missing nothing changes.  Surviving chunks are moved down over the gaps, the file
    /// is truncated, and the directory is rebuilt.  Every chunk carrying a requested hash goes.
    pub fn remove_files<I,T>(&mut self,names: I) -> Result<(),Error>
    where I: IntoIterator<Item=T>, T: AsRef<str> {
        let mut hashes: HashMap<u32,(String,bool)> = HashMap::new();
        for name in names {
            let name = name.as_ref();
            hashes.entry(self.hash(name)).or_insert((name.to_string(),false));
        }

        // verify every name exists before writing anything
        let mut position = END_OF_HEADER;
        for _i in 0..self.header.resource_count {
            let header = self.load_resource_header(position)?;
            if let Some(found) = hashes.get_mut(&header.hash) {
                found.1 = true;
            }
            position = position.saturating_add(header.chunk_size);
        }
        if let Some((name,_)) = hashes.values().find(|(_,found)| !found) {
            return Err(Error::FileNotFound(name.clone()));
        }

        // compact, reads are always ahead of writes
        let mut position = END_OF_HEADER;
        let mut new_position = END_OF_HEADER;
        let mut new_directory = Vec::new();
        for _i in 0..self.header.resource_count {
            let header = self.load_resource_header(position)?;
            if !hashes.contains_key(&header.hash) {
                self.check_payload(position,&header)?;
                let mut data = vec![0;header.compressed_size as usize];
                self.stream.read_exact(&mut data).map_err(read_fault)?;
                self.save_resource_header(&header,new_position)?;
                self.stream.write_all(&data)?;
                new_directory.push(DirectoryEntry {
                    hash: header.hash,
                    offset: new_position,
                    extension: header.extension,
                    filename: header.filename
                });
                new_position = new_position.saturating_add(header.chunk_size);
            } else {
                log::debug!("removing {} from {}",header.filename,position);
            }
            position = position.saturating_add(header.chunk_size);
        }

        // the directory on disk may be stale after unsaved additions, so size from the new layout
        self.stream.set_len(new_position as u64 + new_directory.len() as u64 * SIZE_OF_DIRENTRY as u64)?;
        self.header.resource_count = new_directory.len() as u32;
        self.header.directory_offset = new_position;
        self.directory = new_directory;
        self.save_directory()?;
        self.save_file_header()?;
        Ok(())
    }

    /// Sizes in the header must fit the chunk area before any buffer is made
    fn check_payload(&self,offset: u32,header: &ResourceHeader) -> Result<(),Error> {
        let end = offset as u64 + SIZE_OF_RHEADER as u64 + header.compressed_size as u64;
        if end > self.header.directory_offset as u64 {
            return Err(Error::InvalidResource(format!("payload of {} runs past the chunk area",header.filename)));
        }
        let expanded = header.uncompressed_size as u64;
        let stored = header.compressed_size as u64;
        let too_big = match header.compression() {
            Some(Compression::Lzss) => expanded > stored * lzss::MAX_EXPANSION as u64,
            Some(Compression::None) => expanded != stored,
            _ => false
        };
        if too_big {
            return Err(Error::InvalidResource(format!("uncompressed size of {} does not fit its payload",header.filename)));
        }
        Ok(())
    }
    /// Payload of the resource whose header is at `offset`, expanded, and restored to a PCX
    /// if that setting is on.  Rotated bitmaps cannot be restored and are returned as is.
    fn resource_data_at(&mut self,offset: u32,header: &ResourceHeader) -> Result<Vec<u8>,Error> {
        self.check_payload(offset,header)?;
        self.stream.seek(SeekFrom::Start(offset as u64 + SIZE_OF_RHEADER as u64)).map_err(read_fault)?;
        let mut compressed = vec![0;header.compressed_size as usize];
        self.stream.read_exact(&mut compressed).map_err(read_fault)?;
        let data = match header.compression() {
            Some(Compression::None) => compressed,
            Some(Compression::Lzss) => lzss::decode(&compressed,header.uncompressed_size as usize),
            _ => return Err(Error::InvalidResource(format!("unsupported compression code {}",header.compression_code)))
        };
        if self.opt.restore && header.is_bitmap() {
            if header.is_rotated() {
                log::warn!("{} is rotated, restoring rotated images is not supported",header.filename);
                return Ok(data);
            }
            return pcx::recompress(&data);
        }
        Ok(data)
    }
    /// Payload of a resource given its header.  The header is matched with the directory
    /// by name and hash, failing that by a hash lookup.
    pub fn get_resource_data(&mut self,header: &ResourceHeader) -> Result<Vec<u8>,Error> {
        let found = self.directory.iter()
            .find(|entry| entry.filename==header.filename && entry.hash==header.hash)
            .map(|entry| entry.offset);
        let offset = match found {
            Some(offset) => offset,
            None => self.locate(header.hash,&header.filename.to_string())?.0
        };
        self.resource_data_at(offset,header)
    }

    /// Write the resource to `dir` under its stored name
    pub fn extract_resource(&mut self,header: &ResourceHeader,dir: &Path) -> Result<PathBuf,Error> {
        let data = self.get_resource_data(header)?;
        save_resource(&header.filename,&data,dir)
    }
    /// Extract the named resource into `dir`
    pub fn extract_file(&mut self,name: &str,dir: &Path) -> Result<PathBuf,Error> {
        let hash = self.hash(name);
        let (offset,header) = self.locate(hash,name)?;
        let data = self.resource_data_at(offset,&header)?;
        save_resource(&header.filename,&data,dir)
    }
    /// Extract the resource whose header is at `offset` into `dir`
    pub fn extract_file_at(&mut self,offset: u32,dir: &Path) -> Result<PathBuf,Error> {
        let header = self.load_resource_header(offset)?;
        let data = self.resource_data_at(offset,&header)?;
        save_resource(&header.filename,&data,dir)
    }
    /// Extract every resource into `dir`, in chunk order
    pub fn extract_all(&mut self,dir: &Path) -> Result<Vec<PathBuf>,Error> {
        let mut ans = Vec::new();
        if self.header.version != RESUTIL_VERSION {
            return Ok(ans);
        }
        let mut position = END_OF_HEADER;
        for _i in 0..self.header.resource_count {
            let header = self.load_resource_header(position)?;
            let data = self.resource_data_at(position,&header)?;
            ans.push(save_resource(&header.filename,&data,dir)?);
            position = position.saturating_add(header.chunk_size);
        }
        Ok(ans)
    }
}

// *************** TESTS *****************

#[cfg(test)]
type MemFile = ResourceFile<Cursor<Vec<u8>>>;

#[cfg(test)]
fn new_resfile() -> MemFile {
    let mut ans = ResourceFile::open(Cursor::new(Vec::new())).expect("could not create");
    ans.options_mut().compress = false;
    ans
}

/// three WAV resources saved to a byte vector
#[cfg(test)]
fn three_wavs() -> Vec<u8> {
    let mut resfile = new_resfile();
    resfile.add_data("A.WAV",&[1;10]).unwrap();
    resfile.add_data("B.WAV",&[2;20]).unwrap();
    resfile.add_data("C.WAV",&[3;30]).unwrap();
    resfile.save().unwrap();
    resfile.into_inner().into_inner()
}

#[test]
fn create_empty() {
    let resfile = new_resfile();
    assert_eq!(resfile.count(),0);
    assert_eq!(resfile.file_version(),4);
    assert!(!resfile.options().compress);
    assert!(resfile.directory().is_empty());
}

#[test]
fn invalid_version() {
    let mut resfile = new_resfile();
    resfile.save_file_header().unwrap();
    let mut bytes = resfile.into_inner().into_inner();
    bytes[0..4].copy_from_slice(&3u32.to_le_bytes());
    assert!(matches!(ResourceFile::open(Cursor::new(bytes)),Err(Error::UnsupportedVersion(3))));
}

#[test]
fn invalid_directory() {
    let mut resfile = new_resfile();
    resfile.save_file_header().unwrap();
    let mut bytes = resfile.into_inner().into_inner();
    bytes[4..8].copy_from_slice(&1000u32.to_le_bytes());
    assert!(matches!(ResourceFile::open(Cursor::new(bytes)),Err(Error::IndexOutOfRange)));
}

#[test]
fn invalid_directory_entry() {
    let mut bytes = three_wavs();
    let dir = u32::from_le_bytes([bytes[4],bytes[5],bytes[6],bytes[7]]) as usize;
    bytes[dir+4..dir+8].copy_from_slice(&100000u32.to_le_bytes());
    assert!(matches!(ResourceFile::open(Cursor::new(bytes)),Err(Error::IndexOutOfRange)));
}

#[test]
fn truncated_directory() {
    let mut bytes = three_wavs();
    bytes.truncate(bytes.len() - 5);
    assert!(matches!(ResourceFile::open(Cursor::new(bytes)),Err(Error::InvalidResource(_))));
}

#[test]
fn add_empty_resource() {
    let mut resfile = new_resfile();
    resfile.add_data("FILENAME.FLC",&[]).unwrap();
    assert_eq!(resfile.count(),1);
    let listing = resfile.list_contents(false);
    assert_eq!(listing.len(),1);
    assert_eq!(listing[0].name(),"FILENAME.FLC");
    let header = resfile.get_file_information("filename.flc").unwrap();
    assert_eq!(header.extension,Extension::Flc as u8);
    assert_eq!(header.chunk_size,SIZE_OF_RHEADER);
    assert_eq!(resfile.get_file_offset("FILENAME.FLC").unwrap(),END_OF_HEADER);
}

#[test]
fn reopen_after_save() {
    let bytes = three_wavs();
    assert_eq!(bytes.len(),12 + 3*36 + 60 + 3*22);
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    assert_eq!(resfile.count(),3);
    let names: Vec<String> = resfile.list_contents(false).iter().map(|l| l.name()).collect();
    assert_eq!(names,vec!["A.WAV","B.WAV","C.WAV"]);
    let header = resfile.get_file_information("B.WAV").unwrap();
    assert_eq!(resfile.get_resource_data(&header).unwrap(),vec![2;20]);
    assert!(matches!(resfile.get_file_information("D.WAV"),Err(Error::FileNotFound(_))));
}

#[test]
fn corrupt_start_code() {
    let mut bytes = three_wavs();
    bytes[12] = b'X';
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    assert!(matches!(resfile.get_file_information("A.WAV"),Err(Error::InvalidResource(_))));
}

#[test]
fn corrupt_compressed_size() {
    let mut bytes = three_wavs();
    bytes[20..24].copy_from_slice(&11u32.to_le_bytes());
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    assert!(matches!(resfile.get_file_information("A.WAV"),Err(Error::InvalidResource(_))));
}

#[test]
fn verified_listing() {
    let mut bytes = three_wavs();
    // damage the start code of B.WAV, its chunk size is intact
    let b_offset = 12 + 36 + 10;
    bytes[b_offset] = 0;
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    let listing = resfile.list_contents(true);
    assert_eq!(listing.len(),3);
    assert!(matches!(&listing[0],Listing::Resource(h) if h.uncompressed_size==10));
    assert!(matches!(&listing[1],Listing::Invalid { index: 1, error: Error::InvalidResource(_) }));
    assert_eq!(listing[1].name(),"Item 1 is invalid");
    assert!(matches!(&listing[2],Listing::Resource(h) if h.filename.to_string()=="C.WAV"));
    // the fast listing does not look at the chunks
    assert_eq!(resfile.list_contents(false)[1].name(),"B.WAV");
}

#[test]
fn remove_missing_name() {
    let bytes = three_wavs();
    let mut resfile = ResourceFile::open(Cursor::new(bytes.clone())).unwrap();
    let result = resfile.remove_files(["B.WAV","NOPE.WAV"]);
    assert!(matches!(result,Err(Error::FileNotFound(n)) if n=="NOPE.WAV"));
    assert_eq!(resfile.count(),3);
    assert_eq!(resfile.into_inner().into_inner(),bytes);
}

#[test]
fn remove_one() {
    let bytes = three_wavs();
    let old_len = bytes.len();
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    resfile.remove_files(["b.wav"]).unwrap();
    assert_eq!(resfile.count(),2);
    let bytes = resfile.into_inner().into_inner();
    assert_eq!(bytes.len(),old_len - (36 + 20) - 22);
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    assert_eq!(resfile.count(),2);
    assert!(matches!(resfile.get_file_information("B.WAV"),Err(Error::FileNotFound(_))));
    assert_eq!(resfile.get_file_offset("A.WAV").unwrap(),12);
    assert_eq!(resfile.get_file_offset("C.WAV").unwrap(),12 + 36 + 10);
    let header = resfile.get_file_information("C.WAV").unwrap();
    assert_eq!(resfile.get_resource_data(&header).unwrap(),vec![3;30]);
    let listing = resfile.list_contents(false);
    assert!(matches!(&listing[1],Listing::Entry { offset: 58, .. }));
}

#[test]
fn remove_after_unsaved_add() {
    let mut resfile = ResourceFile::open(Cursor::new(three_wavs())).unwrap();
    // the new chunk overwrites the saved directory and runs past it
    resfile.add_data("D.WAV",&[4;200]).unwrap();
    resfile.remove_files(["D.WAV"]).unwrap();
    let bytes = resfile.into_inner().into_inner();
    assert_eq!(bytes.len(),12 + 3*36 + 60 + 3*22);
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    assert_eq!(resfile.count(),3);
    let header = resfile.get_file_information("C.WAV").unwrap();
    assert_eq!(resfile.get_resource_data(&header).unwrap(),vec![3;30]);
}

#[test]
fn payload_sizes_checked() {
    // stored and expanded sizes agree but run past the chunk area
    let mut bytes = three_wavs();
    bytes[20..24].copy_from_slice(&0x70000000u32.to_le_bytes());
    bytes[24..28].copy_from_slice(&0x70000000u32.to_le_bytes());
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    let header = resfile.get_file_information("A.WAV").unwrap();
    assert!(matches!(resfile.get_resource_data(&header),Err(Error::InvalidResource(_))));
    assert!(matches!(resfile.remove_files(["B.WAV"]),Err(Error::InvalidResource(_))));

    // an LZSS payload cannot expand beyond what its runs can hold
    let mut resfile = new_resfile();
    resfile.options_mut().compress = true;
    let header = resfile.add_data("ZERO.WAV",&[0;1000]).unwrap();
    assert_eq!(header.compression(),Some(Compression::Lzss));
    resfile.save().unwrap();
    let mut bytes = resfile.into_inner().into_inner();
    bytes[24..28].copy_from_slice(&0x70000000u32.to_le_bytes());
    let mut resfile = ResourceFile::open(Cursor::new(bytes)).unwrap();
    let header = resfile.get_file_information("ZERO.WAV").unwrap();
    assert!(matches!(resfile.get_resource_data(&header),Err(Error::InvalidResource(_))));
}

#[test]
fn remove_all() {
    let mut resfile = ResourceFile::open(Cursor::new(three_wavs())).unwrap();
    resfile.remove_files(vec!["A.WAV".to_string(),"B.WAV".to_string(),"C.WAV".to_string()]).unwrap();
    assert_eq!(resfile.count(),0);
    assert_eq!(resfile.into_inner().into_inner().len(),12);
}

#[test]
fn compressed_resource() {
    let mut resfile = new_resfile();
    resfile.options_mut().compress = true;
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(20);
    let header = resfile.add_data("SAM.WAV",text.as_bytes()).unwrap();
    assert_eq!(header.compression(),Some(Compression::Lzss));
    assert!(header.compressed_size < header.uncompressed_size);
    assert_eq!(header.chunk_size,SIZE_OF_RHEADER + header.compressed_size);
    // incompressible data is stored as is
    let header = resfile.add_data("NOISE.WAV",&[1,2,3,4,5]).unwrap();
    assert!(!header.is_compressed());
    assert_eq!(header.compressed_size,5);
    resfile.save().unwrap();
    let mut resfile = ResourceFile::open(Cursor::new(resfile.into_inner().into_inner())).unwrap();
    let header = resfile.get_file_information("SAM.WAV").unwrap();
    assert_eq!(resfile.get_resource_data(&header).unwrap(),text.as_bytes().to_vec());
}

#[test]
fn pcx_resource() {
    let pcx_data = pcx::test_pcx(2,1,4,&[1,2,3,0,0xc3,5,0]);
    let mut resfile = new_resfile();
    let header = resfile.add_data("TEST.PCX",&pcx_data).unwrap();
    assert!(header.is_bitmap());
    assert!(!header.is_rotated());
    assert_eq!(header.uncompressed_size,10 + 8);
    let bitmap = resfile.get_resource_data(&header).unwrap();
    assert_eq!(bitmap,pcx::decompress(&pcx_data).unwrap());
    resfile.options_mut().restore = true;
    let restored = resfile.get_resource_data(&header).unwrap();
    assert_eq!(pcx::decompress(&restored).unwrap(),bitmap);
}

#[test]
fn rotated_pcx_resource() {
    let pcx_data = pcx::test_pcx(2,1,4,&[1,2,3,0,0xc3,5,0]);
    let mut resfile = new_resfile();
    resfile.options_mut().rotate = true;
    resfile.options_mut().restore = true;
    let header = resfile.add_data("TEST.PCX",&pcx_data).unwrap();
    assert!(header.is_bitmap());
    assert!(header.is_rotated());
    // restoring is not possible, the bitmap comes back
    assert_eq!(resfile.get_resource_data(&header).unwrap(),pcx::rotate(&pcx_data).unwrap());
}

#[test]
fn id_hash_resources() {
    let mut resfile = new_resfile();
    resfile.options_mut().hash = HashScheme::Id;
    assert_eq!(resfile.hash_scheme(),HashScheme::Id);
    let header = resfile.add_data("sounds/WAV1209348.WAV",&[7;4]).unwrap();
    assert!(header.uses_id_hash());
    assert_eq!(header.hash,1209348);
    assert_eq!(header.filename.to_string(),"WAV1209348.WA");
    // any name with the same number finds it
    assert_eq!(resfile.get_file_offset("X1209348.FLC").unwrap(),12);
    // first match wins for equal hashes
    resfile.add_data("SFX1209348.WAV",&[8;4]).unwrap();
    let header = resfile.get_file_information("SFX1209348.WAV").unwrap();
    assert_eq!(header.filename.to_string(),"WAV1209348.WA");
}

#[test]
fn resource_too_large() {
    let mut resfile = new_resfile();
    resfile.options_mut().max_resource_size = 4;
    assert!(matches!(resfile.add_data("BIG.WAV",&[0;5]),Err(Error::ResourceTooLarge { size: 5, max: 4 })));
    assert_eq!(resfile.count(),0);
}

#[test]
fn add_and_extract_files() {
    let src_dir = tempfile::tempdir().unwrap();
    std::fs::write(src_dir.path().join("one.wav"),[1;12]).unwrap();
    std::fs::write(src_dir.path().join("two.wav"),[2;12]).unwrap();
    std::fs::write(src_dir.path().join("three.flc"),[3;12]).unwrap();
    let mut resfile = new_resfile();
    let pattern = src_dir.path().join("*.WAV");
    let added = resfile.add_files(&pattern.to_string_lossy()).unwrap();
    assert_eq!(added.len(),2);
    assert_eq!(added[0].filename.to_string(),"ONE.WAV");
    let missing = src_dir.path().join("*.PCX");
    assert!(matches!(resfile.add_files(&missing.to_string_lossy()),Err(Error::FileNotFound(_))));

    let out_dir = tempfile::tempdir().unwrap();
    let path = resfile.extract_file("two.wav",out_dir.path()).unwrap();
    assert_eq!(std::fs::read(path).unwrap(),vec![2;12]);
    let paths = resfile.extract_all(out_dir.path()).unwrap();
    assert_eq!(paths.len(),2);
    assert_eq!(std::fs::read(out_dir.path().join("ONE.WAV")).unwrap(),vec![1;12]);
    let path = resfile.extract_file_at(12,out_dir.path()).unwrap();
    assert!(path.ends_with("ONE.WAV"));
    let header = resfile.get_file_information("TWO.WAV").unwrap();
    std::fs::remove_file(out_dir.path().join("TWO.WAV")).unwrap();
    resfile.extract_resource(&header,out_dir.path()).unwrap();
    assert_eq!(std::fs::read(out_dir.path().join("TWO.WAV")).unwrap(),vec![2;12]);
}

#[test]
fn patterns() {
    assert!(wildcard_match("*.PCX","buymore.pcx"));
    assert!(wildcard_match("WAV??.WAV","WAV12.WAV"));
    assert!(!wildcard_match("WAV??.WAV","WAV123.WAV"));
    assert!(wildcard_match("*","anything"));
    assert!(wildcard_match("A*B*C","AxxBxxC"));
    assert!(!wildcard_match("A*B*C","AxxBxx"));
}
