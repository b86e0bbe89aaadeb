//! Binary layout of the history file (format version 1, little-endian).
//!
//! ```text
//! header   72 bytes  magic, version, flags, counts, SHA-256 of the body
//! records  32 bytes  × record_count, most recent first
//! pool     string_count × (u32 length, UTF-8 bytes)
//! ```
//!
//! Record fields reference strings by pool index, never by byte offset.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use jumpdir_core::path;
use jumpdir_core::HistoryHeader;

use crate::strings::{StrId, StringTable};

pub const MAGIC: [u8; 8] = *b"JUMPDIR\0";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 72;
pub const RECORD_LEN: usize = 32;

const FLAG_DIR_ECHO: u8 = 1 << 0;
const FLAG_VERBOSE: u8 = 1 << 1;
const FLAG_NET_SEARCH: u8 = 1 << 2;
const FLAG_AUTOMAP: u8 = 1 << 3;

const RECORD_VALID: u32 = 1;

/// A record as laid out on disk, strings still as handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub volume_name: StrId,
    pub volume_label: StrId,
    pub path: StrId,
    pub last_verified: DateTime<Utc>,
    pub serial_number: u64,
    pub valid: bool,
}

/// A record to be written, strings resolved.
#[derive(Debug, Clone)]
pub struct RecordImage<'a> {
    pub volume_name: &'a str,
    pub volume_label: &'a str,
    pub path: &'a str,
    pub last_verified: DateTime<Utc>,
    pub serial_number: u64,
    pub valid: bool,
}

/// Result of a successful decode.
#[derive(Debug)]
pub struct Decoded {
    pub header: HistoryHeader,
    pub strings: StringTable,
    pub records: Vec<RawRecord>,
}

/// Reasons a blob cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Corrupt(String),
    UnsupportedVersion(u16),
}

fn corrupt(reason: impl Into<String>) -> DecodeError {
    DecodeError::Corrupt(reason.into())
}

/// Serialize a header and records into one contiguous blob.
///
/// `header.num_hist_entries` is recomputed from the records.
#[must_use]
pub fn encode(header: &HistoryHeader, records: &[RecordImage<'_>]) -> Vec<u8> {
    let mut strings = StringTable::new();
    let mut body = Vec::with_capacity(records.len() * RECORD_LEN);

    for record in records {
        let name = strings.intern(record.volume_name);
        let label = strings.intern(record.volume_label);
        let path = strings.intern(record.path);
        body.extend_from_slice(&name.0.to_le_bytes());
        body.extend_from_slice(&label.0.to_le_bytes());
        body.extend_from_slice(&path.0.to_le_bytes());
        let flags = if record.valid { RECORD_VALID } else { 0 };
        body.extend_from_slice(&flags.to_le_bytes());
        body.extend_from_slice(&record.last_verified.timestamp().to_le_bytes());
        body.extend_from_slice(&record.serial_number.to_le_bytes());
    }

    let pool_start = body.len();
    for s in strings.iter() {
        body.extend_from_slice(&len_u32(s.len()).to_le_bytes());
        body.extend_from_slice(s.as_bytes());
    }
    let pool_len = body.len() - pool_start;

    let live = records.iter().filter(|r| r.valid).count();
    let digest = Sha256::digest(&body);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&len_u16(HEADER_LEN).to_le_bytes());
    out.push(header_flags(header));
    out.extend_from_slice(&[0; 3]);
    out.extend_from_slice(&header.max_hist_size.to_le_bytes());
    out.extend_from_slice(&len_u32(live).to_le_bytes());
    out.extend_from_slice(&len_u32(records.len()).to_le_bytes());
    out.extend_from_slice(&len_u32(strings.len()).to_le_bytes());
    out.extend_from_slice(&len_u32(pool_len).to_le_bytes());
    out.extend_from_slice(&digest);
    out.extend_from_slice(&[0; 4]);
    debug_assert_eq!(out.len(), HEADER_LEN);

    out.extend_from_slice(&body);
    out
}

/// Parse and structurally validate a blob produced by [`encode`].
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedVersion`] for a newer layout, and
/// [`DecodeError::Corrupt`] for anything truncated, inconsistent, or failing
/// the digest check.
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!(
            "truncated header ({} of {HEADER_LEN} bytes)",
            bytes.len()
        )));
    }

    let mut head = Cursor::new(&bytes[..HEADER_LEN]);
    if head.take(8)? != MAGIC {
        return Err(corrupt("bad magic"));
    }
    let version = head.u16()?;
    if version > FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    if version == 0 {
        return Err(corrupt("format version 0"));
    }
    let header_len = usize::from(head.u16()?);
    if header_len != HEADER_LEN {
        return Err(corrupt(format!("header length {header_len}")));
    }
    let flags = head.u8()?;
    head.take(3)?;
    let max_hist_size = head.i32()?;
    let num_hist_entries = head.u32()?;
    let record_count = head.u32()? as usize;
    let string_count = head.u32()? as usize;
    let pool_len = head.u32()? as usize;
    let digest = head.take(32)?;

    let expected = record_count
        .checked_mul(RECORD_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN))
        .and_then(|n| n.checked_add(pool_len))
        .ok_or_else(|| corrupt("size overflow"))?;
    if expected != bytes.len() {
        return Err(corrupt(format!(
            "length mismatch (header implies {expected} bytes, file has {})",
            bytes.len()
        )));
    }

    let body = &bytes[HEADER_LEN..];
    if Sha256::digest(body).as_slice() != digest {
        return Err(corrupt("checksum mismatch"));
    }

    let strings = decode_pool(&body[record_count * RECORD_LEN..], string_count)?;
    let records = decode_records(&body[..record_count * RECORD_LEN], record_count, &strings)?;

    let live = records.iter().filter(|r| r.valid).count();
    if live != num_hist_entries as usize {
        return Err(corrupt(format!(
            "header counts {num_hist_entries} live entries, found {live}"
        )));
    }

    let header = HistoryHeader {
        max_hist_size,
        dir_echo: flags & FLAG_DIR_ECHO != 0,
        verbose: flags & FLAG_VERBOSE != 0,
        net_search: flags & FLAG_NET_SEARCH != 0,
        automap: flags & FLAG_AUTOMAP != 0,
        num_hist_entries,
    };

    Ok(Decoded {
        header,
        strings,
        records,
    })
}

fn decode_pool(pool: &[u8], string_count: usize) -> Result<StringTable, DecodeError> {
    let mut cursor = Cursor::new(pool);
    let mut strings = Vec::with_capacity(string_count.min(pool.len()));
    for i in 0..string_count {
        let len = cursor.u32()? as usize;
        let raw = cursor.take(len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| corrupt(format!("string {i} is not UTF-8: {e}")))?;
        strings.push(s.to_string());
    }
    if !cursor.is_at_end() {
        return Err(corrupt("trailing bytes in string pool"));
    }
    Ok(StringTable::from_strings(strings))
}

fn decode_records(
    raw: &[u8],
    record_count: usize,
    strings: &StringTable,
) -> Result<Vec<RawRecord>, DecodeError> {
    let mut cursor = Cursor::new(raw);
    let mut records = Vec::with_capacity(record_count);
    let mut seen = std::collections::HashSet::new();

    for i in 0..record_count {
        let mut handle = || -> Result<StrId, DecodeError> {
            let id = StrId(cursor.u32()?);
            strings
                .get(id)
                .map(|_| id)
                .ok_or_else(|| corrupt(format!("record {i} references missing string {}", id.0)))
        };
        let volume_name = handle()?;
        let volume_label = handle()?;
        let path_id = handle()?;
        let flags = cursor.u32()?;
        if flags & !RECORD_VALID != 0 {
            return Err(corrupt(format!("record {i} has unknown flags {flags:#x}")));
        }
        let secs = cursor.i64()?;
        let last_verified = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| corrupt(format!("record {i} has timestamp {secs} out of range")))?;
        let serial_number = cursor.u64()?;

        let stored = strings.get(path_id).unwrap_or_default();
        if !path::is_absolute(stored) || path::normalize(stored) != stored {
            return Err(corrupt(format!("record {i} path '{stored}' is not normalized")));
        }
        let name = strings.get(volume_name).unwrap_or_default();
        if !seen.insert((name, serial_number, path::fold_case(stored))) {
            return Err(corrupt(format!("record {i} duplicates '{stored}'")));
        }

        records.push(RawRecord {
            volume_name,
            volume_label,
            path: path_id,
            last_verified,
            serial_number,
            valid: flags & RECORD_VALID != 0,
        });
    }
    Ok(records)
}

fn header_flags(header: &HistoryHeader) -> u8 {
    let mut flags = 0;
    if header.dir_echo {
        flags |= FLAG_DIR_ECHO;
    }
    if header.verbose {
        flags |= FLAG_VERBOSE;
    }
    if header.net_search {
        flags |= FLAG_NET_SEARCH;
    }
    if header.automap {
        flags |= FLAG_AUTOMAP;
    }
    flags
}

fn len_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn len_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Bounds-checked little-endian reader.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| corrupt(format!("unexpected end of data at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        slice.try_into().map_err(|_| corrupt("short read"))
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample() -> Vec<u8> {
        let header = HistoryHeader {
            max_hist_size: 50,
            dir_echo: true,
            ..HistoryHeader::default()
        };
        let records = vec![
            RecordImage {
                volume_name: "C:",
                volume_label: "OS",
                path: "C:/Users/x/work",
                last_verified: at(1_700_000_100),
                serial_number: 0xABCD,
                valid: true,
            },
            RecordImage {
                volume_name: "C:",
                volume_label: "OS",
                path: "C:/old",
                last_verified: at(1_600_000_000),
                serial_number: 0xABCD,
                valid: false,
            },
        ];
        encode(&header, &records)
    }

    #[test]
    fn decode_restores_header_and_records() {
        let decoded = decode(&sample()).unwrap();
        assert_eq!(decoded.header.max_hist_size, 50);
        assert!(decoded.header.dir_echo);
        assert!(decoded.header.net_search);
        assert_eq!(decoded.header.num_hist_entries, 1);
        assert_eq!(decoded.records.len(), 2);
        // volume name and label strings are shared between records
        assert_eq!(decoded.strings.len(), 4);

        let first = &decoded.records[0];
        assert!(first.valid);
        assert_eq!(decoded.strings.get(first.path), Some("C:/Users/x/work"));
        assert_eq!(first.last_verified, at(1_700_000_100));
        assert!(!decoded.records[1].valid);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let bytes = sample();
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(ref r) if r.contains("length mismatch")));

        let err = decode(&bytes[..10]).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(ref r) if r.contains("truncated header")));
    }

    #[test]
    fn flipped_body_byte_fails_checksum() {
        let mut bytes = sample();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::Corrupt("checksum mismatch".into()));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let mut bytes = sample();
        bytes[0] = b'X';
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::Corrupt("bad magic".into()));
    }

    #[test]
    fn newer_version_is_reported_separately() {
        let mut bytes = sample();
        bytes[8..10].copy_from_slice(&7u16.to_le_bytes());
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::UnsupportedVersion(7));
    }

    #[test]
    fn live_count_mismatch_is_corrupt() {
        let mut bytes = sample();
        bytes[20..24].copy_from_slice(&2u32.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(ref r) if r.contains("live entries")));
    }

    #[test]
    fn case_variants_of_one_path_are_duplicates() {
        let image = |path| RecordImage {
            volume_name: "C:",
            volume_label: "OS",
            path,
            last_verified: at(1_700_000_000),
            serial_number: 1,
            valid: true,
        };
        let bytes = encode(
            &HistoryHeader::default(),
            &[image("C:/Users/x/Work"), image("C:/users/X/work")],
        );
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(ref r) if r.contains("duplicates")));
    }

    #[test]
    fn empty_store_round_trips() {
        let bytes = encode(&HistoryHeader::default(), &[]);
        assert_eq!(bytes.len(), HEADER_LEN);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.header, HistoryHeader::default());
        assert!(decoded.records.is_empty());
    }
}
