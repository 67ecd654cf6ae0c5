//! Binary snapshots of a flushed index.
//!
//! Layout, all integers little endian:
//!
//! ```text
//! +------+---------+-------+-------------+-----------------------+
//! | LCTN | version | crc32 | payload len | payload (bincode)     |
//! | 4 B  | u16     | u32   | u64         | IndexSnapshot         |
//! +------+---------+-------+-------------+-----------------------+
//! ```
//!
//! The payload holds the document table and the posting lists. Derived
//! structures (forward term vectors, the suffix dictionary, the live set)
//! are rebuilt on restore.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::{DocId, Posting};
use crate::index::reader::IndexReader;

/// File magic.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"LCTN";

/// Current format version.
pub const SNAPSHOT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4 + 8;

/// One document-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub identifier: String,
    pub term_count: u32,
    pub live: bool,
}

/// One dictionary entry with its postings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTerm {
    pub term: String,
    pub postings: Vec<Posting>,
}

/// Serialized form of a flushed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Documents in id order; the position in this list is the id.
    pub documents: Vec<SnapshotDocument>,
    /// Dictionary in term order.
    pub postings: Vec<SnapshotTerm>,
}

impl IndexSnapshot {
    /// Capture the state visible through `reader`.
    pub fn capture(reader: &IndexReader) -> Self {
        let documents = reader
            .documents()
            .iter()
            .map(|(_, entry, live)| SnapshotDocument {
                identifier: entry.identifier.clone(),
                term_count: entry.term_count,
                live,
            })
            .collect();

        let postings = reader
            .postings()
            .iter()
            .map(|(term, list)| SnapshotTerm {
                term: term.to_string(),
                postings: list.iter().cloned().collect(),
            })
            .collect();

        IndexSnapshot {
            created_at: Utc::now(),
            documents,
            postings,
        }
    }

    /// Rebuild a flushed index. Document ids are preserved.
    pub fn into_index(self) -> Result<InvertedIndex> {
        let doc_count = self.documents.len();
        let mut occurrences: BTreeMap<DocId, Vec<(String, u32)>> = BTreeMap::new();
        for entry in self.postings {
            for posting in entry.postings {
                if posting.doc_id as usize >= doc_count {
                    return Err(LecternError::snapshot(format!(
                        "posting for '{}' references unknown document {}",
                        entry.term, posting.doc_id
                    )));
                }
                let terms = occurrences.entry(posting.doc_id).or_default();
                terms.extend(
                    posting
                        .positions
                        .iter()
                        .map(|&position| (entry.term.clone(), position)),
                );
            }
        }

        let mut index = InvertedIndex::new();
        for (doc_id, document) in self.documents.into_iter().enumerate() {
            let doc_id = doc_id as DocId;
            let terms = occurrences.remove(&doc_id).unwrap_or_default();
            let assigned = index.upsert(&document.identifier, terms);
            if assigned != doc_id {
                return Err(LecternError::snapshot(format!(
                    "duplicate identifier {}",
                    document.identifier
                )));
            }
            if !document.live {
                index.remove(&document.identifier);
            }
        }
        index.flush();
        Ok(index)
    }
}

/// Encode a snapshot with its header.
pub fn encode(snapshot: &IndexSnapshot) -> Result<Vec<u8>> {
    let payload = bincode::serialize(snapshot)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.write_all(SNAPSHOT_MAGIC)?;
    bytes.write_u16::<LittleEndian>(SNAPSHOT_VERSION)?;
    bytes.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    bytes.write_u64::<LittleEndian>(payload.len() as u64)?;
    bytes.extend_from_slice(&payload);

    info!(
        "encoded snapshot: {} documents, {} terms, {} bytes",
        snapshot.documents.len(),
        snapshot.postings.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Validate the header and decode a snapshot.
pub fn decode(bytes: &[u8]) -> Result<IndexSnapshot> {
    if bytes.len() < HEADER_LEN {
        return Err(LecternError::snapshot("truncated header"));
    }

    let mut reader = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(LecternError::snapshot("bad magic"));
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != SNAPSHOT_VERSION {
        return Err(LecternError::snapshot(format!(
            "unsupported version {version}"
        )));
    }

    let checksum = reader.read_u32::<LittleEndian>()?;
    let length = reader.read_u64::<LittleEndian>()?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != length {
        return Err(LecternError::snapshot(format!(
            "payload length {} does not match header {length}",
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(LecternError::snapshot("checksum mismatch"));
    }

    Ok(bincode::deserialize(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.upsert(
            "mem://a",
            vec![("apple".to_string(), 0), ("pie".to_string(), 1)],
        );
        index.upsert("mem://b", vec![("apple".to_string(), 0)]);
        index.upsert("mem://c", vec![("cherry".to_string(), 0)]);
        index.flush();
        index.remove("mem://b");
        index.flush();
        index
    }

    #[test]
    fn test_restore_preserves_ids_and_tombstones() {
        let index = sample_index();
        let bytes = encode(&IndexSnapshot::capture(&index.reader())).unwrap();
        let restored = decode(&bytes).unwrap().into_index().unwrap();

        let reader = restored.reader();
        assert_eq!(reader.live_documents(), &[0, 2]);
        assert_eq!(reader.url_for(2), Some("mem://c"));
        assert_eq!(reader.tombstoned_count(), 1);
        assert_eq!(reader.postings_for("apple").unwrap().len(), 1);
        assert_eq!(reader.term_vector(0).unwrap().frequency("pie"), 1);
    }

    #[test]
    fn test_rejects_corruption() {
        let index = sample_index();
        let mut bytes = encode(&IndexSnapshot::capture(&index.reader())).unwrap();

        assert!(matches!(decode(&bytes[..10]), Err(LecternError::Snapshot(_))));

        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(decode(&bytes), Err(LecternError::Snapshot(_))));

        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(LecternError::Snapshot(_))));
    }
}
