use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec::record::RecordCodec;
use crate::core::error::{Error, Result};

/// Append-only file of fixed-width records, addressed by a dense 0-based row
/// index. Rebuilds always start from `truncate`; there is no update or delete
/// in place.
pub struct TableFile<C: RecordCodec> {
    file: File,
    codec: C,
}

impl<C: RecordCodec> TableFile<C> {
    pub fn open(path: &Path, codec: C) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(TableFile { file, codec })
    }

    /// Appends one record and returns its row index.
    pub fn insert(&mut self, record: &C::Record) -> Result<u32> {
        let size = self.codec.record_size() as u64;
        let len = self.file.seek(SeekFrom::End(0))?;
        if len % size != 0 {
            return Err(Error::integrity(format!(
                "table length {} is not a multiple of the record size {}",
                len, size
            )));
        }
        let bytes = self.codec.encode(Some(record))?;
        self.file.write_all(&bytes)?;
        Ok((len / size) as u32)
    }

    /// Positioned read of one row. Reading past end-of-file is the "no data"
    /// signal and yields `None`.
    pub fn load(&mut self, row: u32) -> Result<Option<C::Record>> {
        let size = self.codec.record_size();
        self.file.seek(SeekFrom::Start(row as u64 * size as u64))?;
        let mut buf = vec![0u8; size];
        match self.file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        self.codec.decode(&buf)
    }

    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
