//! LZSS Compression
//!
//! The resource file flavor of LZSS works on whole bytes.  A 16 bit flag word (little endian)
//! precedes each group of up to 16 tokens, the bits are consumed most significant first:
//! * 1 means copy one literal byte from the input
//! * 0 means a back reference word (little endian) follows, the upper 6 bits are the run
//!   length minus 3, the lower 10 bits are the distance minus 1.  A word of 0 ends the stream.
//!
//! Back references may overlap the bytes they produce, this is how runs longer than the
//! distance are expressed.  The expanded length is not stored in the stream, the caller
//! has to supply it (the resource header carries it).

const WIN_SIZE: usize = 1024; // farthest back reference
const MIN_MATCH: usize = 3; // shortest run that will be tokenized
const MAX_MATCH: usize = 66; // longest run a back reference can hold
const HASH_SIZE: usize = 4096;
const MAX_CHAIN: usize = 128; // candidates examined per position
const NIL: usize = usize::MAX;
/// bound on expanded/compressed, the longest run costs 17 bits for 66 bytes
pub const MAX_EXPANSION: usize = 32;

#[derive(Clone,Copy,Debug,PartialEq)]
enum State {
    Start,
    CopyLiteral,
    CopyRun,
    Advance,
    Done
}

/// Decoding session, the flag word carries a sentinel bit so that
/// the register becomes zero exactly when all 16 flags are used.
struct Decoder<'a> {
    ibuf: &'a [u8],
    ptr: usize,
    ans: Vec<u8>,
    out: usize,
    flags: u16
}

impl<'a> Decoder<'a> {
    fn new(ibuf: &'a [u8],expected_len: usize) -> Self {
        Self {
            ibuf,
            ptr: 0,
            ans: vec![0;expected_len],
            out: 0,
            flags: 0
        }
    }
    fn get_word(&mut self) -> Option<u16> {
        if self.ptr + 2 > self.ibuf.len() {
            log::warn!("LZSS stream ended without terminator");
            return None;
        }
        let word = u16::from_le_bytes([self.ibuf[self.ptr],self.ibuf[self.ptr+1]]);
        self.ptr += 2;
        Some(word)
    }
    fn start(&mut self) -> State {
        let word = match self.get_word() {
            Some(w) => w,
            None => return State::Done
        };
        self.flags = (word << 1) | 1;
        match word >> 15 {
            1 => State::CopyLiteral,
            _ => State::CopyRun
        }
    }
    fn copy_literal(&mut self) -> State {
        if self.out >= self.ans.len() || self.ptr >= self.ibuf.len() {
            log::warn!("LZSS literal at {} has nowhere to go",self.out);
            return State::Done;
        }
        self.ans[self.out] = self.ibuf[self.ptr];
        self.out += 1;
        self.ptr += 1;
        State::Advance
    }
    fn copy_run(&mut self) -> State {
        let word = match self.get_word() {
            Some(w) => w,
            None => return State::Done
        };
        if word == 0 {
            return State::Done;
        }
        let run_length = (word >> 10) as usize + MIN_MATCH;
        let distance = (word & 0x3ff) as usize + 1;
        if distance > self.out {
            log::warn!("LZSS distance {} reaches before start of output at {}",distance,self.out);
            return State::Done;
        }
        for _i in 0..run_length {
            if self.out >= self.ans.len() {
                log::warn!("LZSS run overflows expected length {}",self.ans.len());
                return State::Done;
            }
            self.ans[self.out] = self.ans[self.out - distance];
            self.out += 1;
        }
        State::Advance
    }
    /// consume the next flag, reloading the flag word when only the sentinel is left
    fn advance(&mut self) -> State {
        if self.out >= self.ans.len() {
            return State::Done;
        }
        let test_msb = self.flags >> 15;
        self.flags <<= 1;
        if self.flags == 0 {
            return State::Start;
        }
        match test_msb {
            1 => State::CopyLiteral,
            _ => State::CopyRun
        }
    }
    fn decode(mut self) -> Vec<u8> {
        let mut state = State::Start;
        while state != State::Done {
            state = match state {
                State::Start => self.start(),
                State::CopyLiteral => self.copy_literal(),
                State::CopyRun => self.copy_run(),
                State::Advance => self.advance(),
                State::Done => State::Done
            };
        }
        if self.out < self.ans.len() {
            log::debug!("LZSS expanded {} of {} bytes",self.out,self.ans.len());
        }
        self.ans
    }
}

/// Accumulates tokens, back-patching each flag word as its bits are assigned
struct TokenWriter {
    ans: Vec<u8>,
    flag_pos: usize,
    flags: u16,
    used: usize
}

impl TokenWriter {
    fn new() -> Self {
        Self {
            ans: Vec::new(),
            flag_pos: 0,
            flags: 0,
            used: 16
        }
    }
    fn put_flag(&mut self,literal: bool) {
        if self.used == 16 {
            self.flag_pos = self.ans.len();
            self.ans.extend_from_slice(&[0,0]);
            self.flags = 0;
            self.used = 0;
        }
        if literal {
            self.flags |= 0x8000 >> self.used;
        }
        self.used += 1;
        self.ans[self.flag_pos..self.flag_pos+2].copy_from_slice(&self.flags.to_le_bytes());
    }
    fn put_literal(&mut self,c: u8) {
        self.put_flag(true);
        self.ans.push(c);
    }
    fn put_run(&mut self,length: usize,distance: usize) {
        self.put_flag(false);
        let word = (((length - MIN_MATCH) << 10) | (distance - 1)) as u16;
        self.ans.extend_from_slice(&word.to_le_bytes());
    }
    fn finish(mut self) -> Vec<u8> {
        self.put_flag(false);
        self.ans.extend_from_slice(&[0,0]);
        self.ans
    }
}

/// Hash chains over 3 byte prefixes, `prev` links each position to the
/// previous position with the same key.
struct MatchFinder {
    head: Vec<usize>,
    prev: Vec<usize>
}

impl MatchFinder {
    fn new(n: usize) -> Self {
        Self {
            head: vec![NIL;HASH_SIZE],
            prev: vec![NIL;n]
        }
    }
    fn key(ibuf: &[u8],pos: usize) -> usize {
        ((ibuf[pos] as usize) << 8 ^ (ibuf[pos+1] as usize) << 4 ^ ibuf[pos+2] as usize) & (HASH_SIZE - 1)
    }
    fn insert(&mut self,ibuf: &[u8],pos: usize) {
        if pos + MIN_MATCH > ibuf.len() {
            return;
        }
        let k = Self::key(ibuf,pos);
        self.prev[pos] = self.head[k];
        self.head[k] = pos;
    }
    /// Longest match for the run starting at `pos`, as (length,distance).
    /// Length 3 at distance 1 is skipped, it would encode as the end of stream word.
    fn find(&self,ibuf: &[u8],pos: usize) -> Option<(usize,usize)> {
        if pos + MIN_MATCH > ibuf.len() {
            return None;
        }
        let max_len = usize::min(MAX_MATCH,ibuf.len() - pos);
        let mut best: Option<(usize,usize)> = None;
        let mut curs = self.head[Self::key(ibuf,pos)];
        let mut chain = 0;
        while curs != NIL && pos - curs <= WIN_SIZE && chain < MAX_CHAIN {
            let mut len = 0;
            while len < max_len && ibuf[curs+len] == ibuf[pos+len] {
                len += 1;
            }
            let distance = pos - curs;
            let best_len = best.map_or(0,|(l,_)| l);
            if len >= MIN_MATCH && len > best_len && !(len == MIN_MATCH && distance == 1) {
                best = Some((len,distance));
                if len == max_len {
                    break;
                }
            }
            curs = self.prev[curs];
            chain += 1;
        }
        best
    }
}

/// Main compression function, greedy parse over a 1024 byte window.
pub fn encode(ibuf: &[u8]) -> Vec<u8> {
    let mut writer = TokenWriter::new();
    let mut finder = MatchFinder::new(ibuf.len());
    let mut pos = 0;
    while pos < ibuf.len() {
        match finder.find(ibuf,pos) {
            Some((length,distance)) => {
                log::trace!("run of {} at distance {}",length,distance);
                writer.put_run(length,distance);
                for p in pos..pos+length {
                    finder.insert(ibuf,p);
                }
                pos += length;
            },
            None => {
                writer.put_literal(ibuf[pos]);
                finder.insert(ibuf,pos);
                pos += 1;
            }
        }
    }
    let ans = writer.finish();
    log::debug!("LZSS compressed {} into {}",ibuf.len(),ans.len());
    ans
}

/// Main decompression function.  The result always has `expected_len` bytes,
/// a short or malformed stream leaves the tail zeroed.
pub fn decode(ibuf: &[u8],expected_len: usize) -> Vec<u8> {
    Decoder::new(ibuf,expected_len).decode()
}

#[test]
fn compression_works() {
    let compressed = encode("ABABABAB".as_bytes());
    assert_eq!(compressed,hex::decode("00C04142010C0000").unwrap());
    // run at distance 1 must be at least 4 long
    let compressed = encode("AAAAA".as_bytes());
    assert_eq!(compressed,hex::decode("00804100040000").unwrap());
    let compressed = encode("AAAA".as_bytes());
    assert_eq!(compressed,hex::decode("00F0414141410000").unwrap());
}

#[test]
fn empty_stream() {
    let compressed = encode(&[]);
    assert_eq!(compressed,vec![0,0,0,0]);
    assert_eq!(decode(&compressed,0),Vec::<u8>::new());
}

#[test]
fn expansion_works() {
    let expanded = decode(&hex::decode("00C04142010C0000").unwrap(),8);
    assert_eq!(expanded,"ABABABAB".as_bytes().to_vec());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = encode(test_data);
    assert!(compressed.len() < test_data.len());
    assert_eq!(decode(&compressed,test_data.len()),test_data.to_vec());

    // enough literals to roll over several flag words
    let test_data: Vec<u8> = (0..40).collect();
    let compressed = encode(&test_data);
    assert_eq!(decode(&compressed,test_data.len()),test_data);
}

#[test]
fn invertibility_long() {
    // pseudo random bytes drawn from a small alphabet with repeated stretches
    let mut seed: u32 = 12345;
    let mut test_data = Vec::new();
    while test_data.len() < 20000 {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        let sym = (seed >> 16) as u8 % 6;
        let rep = ((seed >> 8) & 0x7f) as usize;
        if rep > 100 && test_data.len() > 2000 {
            let start = test_data.len() - 1500;
            let copy: Vec<u8> = test_data[start..start+rep].to_vec();
            test_data.extend(copy);
        } else {
            test_data.push(sym + b'a');
        }
    }
    let compressed = encode(&test_data);
    assert!(compressed.len() < test_data.len());
    assert_eq!(decode(&compressed,test_data.len()),test_data);

    let zeros = vec![0u8;5000];
    let compressed = encode(&zeros);
    assert!(compressed.len() < 300);
    assert_eq!(decode(&compressed,zeros.len()),zeros);
}

#[test]
fn malformed_streams_stop() {
    // truncated after the literals
    let expanded = decode(&hex::decode("00C04142").unwrap(),8);
    assert_eq!(expanded,vec![0x41,0x42,0,0,0,0,0,0]);
    // back reference before start of output
    let expanded = decode(&hex::decode("0080410A0C0000").unwrap(),4);
    assert_eq!(expanded,vec![0x41,0,0,0]);
    // run longer than the expected length
    let expanded = decode(&hex::decode("00C04142010C0000").unwrap(),5);
    assert_eq!(expanded,"ABABA".as_bytes().to_vec());
}
