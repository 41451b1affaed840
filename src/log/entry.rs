//! Log entry definitions
//!
//! Defines a single log record and its fixed-layout binary encoding.

use bytes::{Buf, BufMut};

use crate::error::{CaskError, Result};

/// Header size: key_len (4) + value_len (4) + namespace_len (4) + mark (2) = 14 bytes
pub const HEADER_SIZE: usize = 14;

/// Operation recorded by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Mark {
    /// Key now maps to the entry's value
    Put = 0,

    /// Tombstone: key was deleted
    Delete = 1,
}

impl Mark {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for Mark {
    type Error = u16;

    fn try_from(raw: u16) -> std::result::Result<Self, Self::Error> {
        match raw {
            0 => Ok(Mark::Put),
            1 => Ok(Mark::Delete),
            other => Err(other),
        }
    }
}

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Namespace (bucket) the key belongs to; empty for the default namespace
    pub namespace: Vec<u8>,

    pub key: Vec<u8>,

    /// Empty for tombstones
    pub value: Vec<u8>,

    pub mark: Mark,
}

/// The fixed-size prefix of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub key_len: u32,
    pub value_len: u32,
    pub namespace_len: u32,
    pub mark: Mark,
}

impl EntryHeader {
    /// Bytes following the header
    pub fn payload_len(&self) -> u64 {
        self.key_len as u64 + self.value_len as u64 + self.namespace_len as u64
    }

    /// Bytes the whole record occupies on disk
    pub fn entry_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_len()
    }

    /// Parse the 14-byte header.
    ///
    /// The caller must hand over at least `HEADER_SIZE` bytes; anything
    /// shorter, or an unknown mark, is reported as a corrupt record at offset 0.
    /// Callers that know the record's file offset remap the error.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(CaskError::corrupt(
                0,
                format!("header needs {} bytes, got {}", HEADER_SIZE, buf.len()),
            ));
        }

        let key_len = buf.get_u32();
        let value_len = buf.get_u32();
        let namespace_len = buf.get_u32();
        let raw_mark = buf.get_u16();

        let mark = Mark::try_from(raw_mark)
            .map_err(|raw| CaskError::corrupt(0, format!("unknown mark {}", raw)))?;

        Ok(Self {
            key_len,
            value_len,
            namespace_len,
            mark,
        })
    }
}

impl Entry {
    /// Create a PUT entry
    pub fn put(
        namespace: impl Into<Vec<u8>>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
            mark: Mark::Put,
        }
    }

    /// Create a DEL tombstone with an empty value
    pub fn delete(namespace: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: Vec::new(),
            mark: Mark::Delete,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.mark == Mark::Delete
    }

    /// Exact number of bytes this entry occupies on disk.
    ///
    /// Also the stride a sequential scan advances by.
    pub fn size(&self) -> u64 {
        (HEADER_SIZE + self.key.len() + self.value.len() + self.namespace.len()) as u64
    }

    /// Header derived from the current field lengths
    pub fn header(&self) -> Result<EntryHeader> {
        Ok(EntryHeader {
            key_len: field_len("key", &self.key)?,
            value_len: field_len("value", &self.value)?,
            namespace_len: field_len("namespace", &self.namespace)?,
            mark: self.mark,
        })
    }

    /// Encode to bytes
    ///
    /// Format: key_len | value_len | namespace_len | mark | key | value | namespace
    pub fn encode(&self) -> Result<Vec<u8>> {
        let header = self.header()?;

        let mut buf = Vec::with_capacity(self.size() as usize);
        buf.put_u32(header.key_len);
        buf.put_u32(header.value_len);
        buf.put_u32(header.namespace_len);
        buf.put_u16(header.mark.as_u16());
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);
        buf.put_slice(&self.namespace);

        Ok(buf)
    }

    /// Split a payload into an entry, given its already-decoded header
    pub fn from_parts(header: EntryHeader, payload: &[u8]) -> Result<Self> {
        if payload.len() as u64 != header.payload_len() {
            return Err(CaskError::corrupt(
                0,
                format!(
                    "payload needs {} bytes, got {}",
                    header.payload_len(),
                    payload.len()
                ),
            ));
        }

        let (key, rest) = payload.split_at(header.key_len as usize);
        let (value, namespace) = rest.split_at(header.value_len as usize);

        Ok(Self {
            namespace: namespace.to_vec(),
            key: key.to_vec(),
            value: value.to_vec(),
            mark: header.mark,
        })
    }

    /// Decode one full record from the start of `buf`.
    ///
    /// Trailing bytes beyond the record are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = EntryHeader::decode(buf)?;
        let end = header.entry_size();

        if (buf.len() as u64) < end {
            return Err(CaskError::TornRecord {
                offset: 0,
                needed: end,
                available: buf.len() as u64,
            });
        }

        Self::from_parts(header, &buf[HEADER_SIZE..end as usize])
    }
}

fn field_len(field: &'static str, bytes: &[u8]) -> Result<u32> {
    u32::try_from(bytes.len()).map_err(|_| CaskError::EntryTooLarge {
        field,
        len: bytes.len(),
    })
}
