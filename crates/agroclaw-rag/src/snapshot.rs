//! Binary snapshot of the vector index.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic    b"AGRX"           4 bytes
//! version  u16               format revision, currently 1
//! doc_len  u32               length of the document JSON block
//! docs     doc_len bytes     Vec<Document> as JSON
//! rows     u32               embedding count
//! dims     u32               vector width
//! matrix   rows*dims f32     row-major embedding matrix
//! ```
//!
//! Loading fails closed: any magic/version/length surprise is a
//! `Snapshot` error and the caller rebuilds from the database.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use agroclaw_core::types::Document;
use agroclaw_core::{AgroClawError, Result};

use crate::index::VectorIndex;

const MAGIC: &[u8; 4] = b"AGRX";
const VERSION: u16 = 1;

/// Write the index to `path` atomically (temp file, then rename).
pub fn save(path: &Path, index: &VectorIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp)?;
        let mut w = BufWriter::new(file);

        w.write_all(MAGIC)?;
        w.write_u16::<LittleEndian>(VERSION)?;

        let docs_json = serde_json::to_vec(index.documents())
            .map_err(|e| AgroClawError::Snapshot(format!("Failed to encode documents: {e}")))?;
        w.write_u32::<LittleEndian>(docs_json.len() as u32)?;
        w.write_all(&docs_json)?;

        let rows = index.embeddings().len() as u32;
        let dims = index.embeddings().first().map(|v| v.len()).unwrap_or(0) as u32;
        w.write_u32::<LittleEndian>(rows)?;
        w.write_u32::<LittleEndian>(dims)?;
        for row in index.embeddings() {
            if row.len() != dims as usize {
                return Err(AgroClawError::Snapshot(format!(
                    "Ragged embedding row: {} vs {} dims",
                    row.len(),
                    dims
                )));
            }
            for v in row {
                w.write_f32::<LittleEndian>(*v)?;
            }
        }
        w.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read an index back. Every failure mode maps to `Snapshot`.
pub fn load(path: &Path) -> Result<VectorIndex> {
    let file = File::open(path)
        .map_err(|e| AgroClawError::Snapshot(format!("Cannot open snapshot: {e}")))?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated header: {e}")))?;
    if &magic != MAGIC {
        return Err(AgroClawError::Snapshot("Bad magic".into()));
    }
    let version = r
        .read_u16::<LittleEndian>()
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated header: {e}")))?;
    if version != VERSION {
        return Err(AgroClawError::Snapshot(format!(
            "Unsupported snapshot version {version} (expected {VERSION})"
        )));
    }

    let doc_len = r
        .read_u32::<LittleEndian>()
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated header: {e}")))? as usize;
    let mut docs_json = vec![0u8; doc_len];
    r.read_exact(&mut docs_json)
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated document block: {e}")))?;
    let documents: Vec<Document> = serde_json::from_slice(&docs_json)
        .map_err(|e| AgroClawError::Snapshot(format!("Corrupt document block: {e}")))?;

    let rows = r
        .read_u32::<LittleEndian>()
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated matrix header: {e}")))? as usize;
    let dims = r
        .read_u32::<LittleEndian>()
        .map_err(|e| AgroClawError::Snapshot(format!("Truncated matrix header: {e}")))? as usize;

    let mut embeddings = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut row = Vec::with_capacity(dims);
        for _ in 0..dims {
            row.push(
                r.read_f32::<LittleEndian>()
                    .map_err(|e| AgroClawError::Snapshot(format!("Truncated matrix: {e}")))?,
            );
        }
        embeddings.push(row);
    }

    if documents.len() != rows {
        return Err(AgroClawError::Snapshot(format!(
            "Snapshot inconsistent: {} documents vs {} rows",
            documents.len(),
            rows
        )));
    }

    VectorIndex::new(documents, embeddings)
}
