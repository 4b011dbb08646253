//! Backing sources a [crate::stream::Stream] reads from.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use crate::errors::{Error, Result};

/// A seekable file or an in-memory buffer. Both know their total length.
#[derive(Debug)]
pub enum Source {
    File { file: File, length: u64 },
    Memory(Vec<u8>),
}

impl Source {
    /// Wraps an open file, measuring its length once.
    pub fn file(mut file: File) -> Result<Self> {
        let length = file.seek(SeekFrom::End(0)).map_err(|e| Error::SeekFailed {
            offset: 0,
            reason: e.to_string(),
        })?;

        Ok(Source::File { file, length })
    }

    pub fn len(&self) -> u64 {
        match self {
            Source::File { length, .. } => *length,
            Source::Memory(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` from absolute `offset`.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        match self {
            Source::File { file, .. } => {
                let mut file = file;
                file.seek(SeekFrom::Start(offset))
                    .map_err(|e| Error::SeekFailed {
                        offset,
                        reason: e.to_string(),
                    })?;
                file.read_exact(buf).map_err(|e| Error::ReadFailed {
                    offset,
                    reason: e.to_string(),
                })
            }
            Source::Memory(data) => {
                let start = usize::try_from(offset).ok();
                let range = start.and_then(|s| Some(s..s.checked_add(buf.len())?));
                let src = range
                    .and_then(|r| data.get(r))
                    .ok_or_else(|| Error::ReadFailed {
                        offset,
                        reason: format!("range of {} byte(s) outside buffer", buf.len()),
                    })?;
                buf.copy_from_slice(src);
                Ok(())
            }
        }
    }
}
