use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::index::key::IndexKey;

/// Cell value reserved for "free"; row `u32::MAX` is therefore unencodable.
const EMPTY_CELL: u32 = u32::MAX;
const HEAD_SIZE: usize = 4;
const CELL_SIZE: usize = 4;

/// Hash-bucketed inverted index mapping a key to an unordered collection of
/// row indices, split across two files: a slot-addressed key file and a
/// block-chained posting-list file.
///
/// Collisions resolve by a forward, non-wrapping linear probe, so the key
/// file may grow past its nominal bucket count and probe cost is unbounded in
/// adversarial cases. That behavior is deliberate; there is no rehashing.
pub struct InvertedIndex<K: IndexKey> {
    keys: File,
    values: File,
    buckets: u32,
    block_size: u32,
    allow_duplicates: bool,
    _key: PhantomData<K>,
}

enum SlotProbe {
    /// The key is present with this posting-list head block.
    Found { head: u32 },
    /// First unclaimed slot on the probe path.
    Empty { offset: u64 },
}

impl<K: IndexKey> InvertedIndex<K> {
    pub fn open(
        key_path: &Path,
        value_path: &Path,
        buckets: u32,
        block_size: u32,
        allow_duplicates: bool,
    ) -> Result<Self> {
        if buckets == 0 || block_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!(
                    "bucket count {} and block size {} must both be nonzero",
                    buckets, block_size
                ),
            ));
        }
        let keys = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(key_path)?;
        let values = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(value_path)?;
        Ok(InvertedIndex {
            keys,
            values,
            buckets,
            block_size,
            allow_duplicates,
            _key: PhantomData,
        })
    }

    fn slot_size(&self) -> u64 {
        (K::SIZE + HEAD_SIZE) as u64
    }

    fn block_bytes(&self) -> u64 {
        (self.block_size as u64 + 1) * CELL_SIZE as u64
    }

    /// Adds `value` to the key's posting list, claiming a key slot and a
    /// fresh head block if the key is new.
    pub fn insert(&mut self, key: &K, value: u32) -> Result<()> {
        if value == EMPTY_CELL {
            return Err(Error::integrity(format!(
                "row index {} collides with the free cell sentinel",
                value
            )));
        }
        let encoded = key.encode()?;
        match self.find_slot(key.bucket(self.buckets), &encoded)? {
            SlotProbe::Found { head } => self.append_value(head, value),
            SlotProbe::Empty { offset } => {
                let head = self.allocate_block(value)?;
                self.keys.seek(SeekFrom::Start(offset))?;
                self.keys.write_all(&encoded)?;
                self.keys.write_all(&head.to_le_bytes())?;
                Ok(())
            }
        }
    }

    /// Every value stored under `key`, in insertion order. An absent key is a
    /// normal outcome and yields an empty list.
    pub fn get(&mut self, key: &K) -> Result<Vec<u32>> {
        let encoded = key.encode()?;
        match self.find_slot(key.bucket(self.buckets), &encoded)? {
            SlotProbe::Found { head } => self.collect_chain(head),
            SlotProbe::Empty { .. } => Ok(Vec::new()),
        }
    }

    /// Forward probe from the nominal bucket. Stops at the key's own slot, at
    /// the first all-zero slot, or at end-of-file (which claims new territory
    /// past the nominal bucket count).
    fn find_slot(&mut self, bucket: u32, encoded: &[u8]) -> Result<SlotProbe> {
        let slot_size = self.slot_size();
        let mut offset = bucket as u64 * slot_size;
        loop {
            self.keys.seek(SeekFrom::Start(offset))?;
            let mut slot = vec![0u8; slot_size as usize];
            match self.keys.read_exact(&mut slot) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(SlotProbe::Empty { offset });
                }
                Err(e) => return Err(e.into()),
            }
            let (key_bytes, head_bytes) = slot.split_at(K::SIZE);
            if key_bytes.iter().all(|&b| b == 0) {
                return Ok(SlotProbe::Empty { offset });
            }
            if key_bytes == encoded {
                let mut head = [0u8; HEAD_SIZE];
                head.copy_from_slice(head_bytes);
                return Ok(SlotProbe::Found {
                    head: u32::from_le_bytes(head),
                });
            }
            offset += slot_size;
        }
    }

    /// Appends a block holding `value` in its first cell and returns its
    /// 0-based block index.
    fn allocate_block(&mut self, value: u32) -> Result<u32> {
        let block_bytes = self.block_bytes();
        let len = self.values.seek(SeekFrom::End(0))?;
        if len % block_bytes != 0 {
            return Err(Error::integrity(format!(
                "posting file length {} is not a multiple of the block size {}",
                len, block_bytes
            )));
        }
        let index = (len / block_bytes) as u32;
        let mut block = Vec::with_capacity(block_bytes as usize);
        block.extend_from_slice(&value.to_le_bytes());
        for _ in 1..self.block_size {
            block.extend_from_slice(&EMPTY_CELL.to_le_bytes());
        }
        block.extend_from_slice(&0u32.to_le_bytes()); // no next block
        self.values.write_all(&block)?;
        Ok(index)
    }

    fn read_block(&mut self, index: u32) -> Result<(Vec<u32>, u32)> {
        self.values
            .seek(SeekFrom::Start(index as u64 * self.block_bytes()))?;
        let mut buf = vec![0u8; self.block_bytes() as usize];
        match self.values.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // a chained block must exist; a dangling link is corruption
                return Err(Error::integrity(format!(
                    "posting chain block {} lies past the end of the file",
                    index
                )));
            }
            Err(e) => return Err(e.into()),
        }
        let mut cells = Vec::with_capacity(self.block_size as usize);
        for i in 0..self.block_size as usize {
            let mut raw = [0u8; CELL_SIZE];
            raw.copy_from_slice(&buf[i * CELL_SIZE..(i + 1) * CELL_SIZE]);
            cells.push(u32::from_le_bytes(raw));
        }
        let mut raw = [0u8; CELL_SIZE];
        raw.copy_from_slice(&buf[self.block_size as usize * CELL_SIZE..]);
        Ok((cells, u32::from_le_bytes(raw)))
    }

    /// Walks the chain from `head` and writes `value` into the first free
    /// cell, linking a fresh block onto the tail when every cell is taken.
    /// Cells fill front to back, so the first free cell is also proof the
    /// value is absent from the rest of the chain.
    fn append_value(&mut self, head: u32, value: u32) -> Result<()> {
        let mut block = head;
        loop {
            let (cells, next) = self.read_block(block)?;
            for (i, cell) in cells.iter().enumerate() {
                if !self.allow_duplicates && *cell == value {
                    return Ok(());
                }
                if *cell == EMPTY_CELL {
                    let offset = block as u64 * self.block_bytes() + (i * CELL_SIZE) as u64;
                    self.values.seek(SeekFrom::Start(offset))?;
                    self.values.write_all(&value.to_le_bytes())?;
                    return Ok(());
                }
            }
            if next == 0 {
                let fresh = self.allocate_block(value)?;
                let link_offset =
                    block as u64 * self.block_bytes() + (self.block_size as usize * CELL_SIZE) as u64;
                self.values.seek(SeekFrom::Start(link_offset))?;
                self.values.write_all(&fresh.to_le_bytes())?;
                return Ok(());
            }
            block = next;
        }
    }

    fn collect_chain(&mut self, head: u32) -> Result<Vec<u32>> {
        let mut values = Vec::new();
        let mut block = head;
        loop {
            let (cells, next) = self.read_block(block)?;
            for cell in cells {
                if cell == EMPTY_CELL {
                    // a short block is always the tail of its chain
                    return Ok(values);
                }
                values.push(cell);
            }
            if next == 0 {
                return Ok(values);
            }
            block = next;
        }
    }

    /// Resets both files ahead of a full rebuild.
    pub fn truncate(&mut self) -> Result<()> {
        self.keys.set_len(0)?;
        self.keys.seek(SeekFrom::Start(0))?;
        self.values.set_len(0)?;
        self.values.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.keys.sync_all()?;
        self.values.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::key::WordKey;

    fn open_index(
        dir: &tempfile::TempDir,
        buckets: u32,
        block_size: u32,
        allow_duplicates: bool,
    ) -> InvertedIndex<u32> {
        InvertedIndex::open(
            &dir.path().join("idx.posting"),
            &dir.path().join("idx.dictionary"),
            buckets,
            block_size,
            allow_duplicates,
        )
        .unwrap()
    }

    #[test]
    fn missing_key_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 4, false);
        assert_eq!(index.get(&5).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn values_come_back_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 4, false);
        for value in [9, 2, 7, 4] {
            index.insert(&3, value).unwrap();
        }
        assert_eq!(index.get(&3).unwrap(), vec![9, 2, 7, 4]);
    }

    #[test]
    fn chain_spans_blocks_at_block_size_two() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 2, false);
        index.insert(&1, 10).unwrap();
        index.insert(&1, 11).unwrap();
        index.insert(&1, 12).unwrap();
        assert_eq!(index.get(&1).unwrap(), vec![10, 11, 12]);
    }

    #[test]
    fn long_chains_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 8, 3, false);
        let values: Vec<u32> = (0..50).collect();
        for value in &values {
            index.insert(&2, *value).unwrap();
        }
        assert_eq!(index.get(&2).unwrap(), values);
    }

    #[test]
    fn duplicate_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut dedup = open_index(&dir, 16, 4, false);
        dedup.insert(&1, 42).unwrap();
        dedup.insert(&1, 42).unwrap();
        assert_eq!(dedup.get(&1).unwrap(), vec![42]);

        let dir2 = tempfile::tempdir().unwrap();
        let mut dups = open_index(&dir2, 16, 4, true);
        dups.insert(&1, 42).unwrap();
        dups.insert(&1, 42).unwrap();
        assert_eq!(dups.get(&1).unwrap(), vec![42, 42]);
    }

    #[test]
    fn colliding_keys_probe_forward() {
        let dir = tempfile::tempdir().unwrap();
        // bucket count 4: keys 3, 7, 11 all land on bucket 3 and probe past
        // the nominal table end
        let mut index = open_index(&dir, 4, 4, false);
        index.insert(&3, 30).unwrap();
        index.insert(&7, 70).unwrap();
        index.insert(&11, 110).unwrap();
        assert_eq!(index.get(&3).unwrap(), vec![30]);
        assert_eq!(index.get(&7).unwrap(), vec![70]);
        assert_eq!(index.get(&11).unwrap(), vec![110]);
        assert_eq!(index.get(&15).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn interleaved_keys_keep_separate_chains() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 2, false);
        for round in 0..5u32 {
            index.insert(&1, round * 2).unwrap();
            index.insert(&2, round * 2 + 1).unwrap();
        }
        assert_eq!(index.get(&1).unwrap(), vec![0, 2, 4, 6, 8]);
        assert_eq!(index.get(&2).unwrap(), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn truncate_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 4, false);
        index.insert(&1, 10).unwrap();
        index.truncate().unwrap();
        assert_eq!(index.get(&1).unwrap(), Vec::<u32>::new());
        index.insert(&1, 20).unwrap();
        assert_eq!(index.get(&1).unwrap(), vec![20]);
    }

    #[test]
    fn sentinel_row_is_an_integrity_fault() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = open_index(&dir, 16, 4, false);
        assert_eq!(
            index.insert(&1, u32::MAX).unwrap_err().kind,
            ErrorKind::Integrity
        );
    }

    #[test]
    fn word_keys_index_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut index: InvertedIndex<WordKey> = InvertedIndex::open(
            &dir.path().join("words.posting"),
            &dir.path().join("words.dictionary"),
            64,
            4,
            false,
        )
        .unwrap();
        index.insert(&WordKey::new("gloomhaven"), 0).unwrap();
        index.insert(&WordKey::new("gloomhaven"), 3).unwrap();
        index.insert(&WordKey::new("catan"), 1).unwrap();
        assert_eq!(index.get(&WordKey::new("gloomhaven")).unwrap(), vec![0, 3]);
        assert_eq!(index.get(&WordKey::new("catan")).unwrap(), vec![1]);
        assert_eq!(index.get(&WordKey::new("azul")).unwrap(), Vec::<u32>::new());
    }
}
