use std::collections::{HashSet, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::codec::record::{Pair, PairCodec, RecordCodec};
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::btree::{BTree, NodeId};

/// Flat-file rendition of a fully-built ordered index, readable without
/// deserializing the whole tree.
///
/// The file is a breadth-first array of node slots, each holding exactly
/// `order - 1` encoded entries and no child pointers: the *n*-th child of
/// slot *i* lives at slot `order*i + n + 1`, so descent is pure arithmetic.
/// An all-zero slot means "no node here". The addressing only stays valid
/// because the dump emits an explicit placeholder slot for every missing
/// child of every visited position.
pub struct TreeFile {
    file: File,
    order: u32,
}

impl TreeFile {
    pub fn open(path: &Path, order: u32) -> Result<Self> {
        if order < 3 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("tree order must be at least 3, got {}", order),
            ));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(TreeFile { file, order })
    }

    fn slot_size(&self) -> usize {
        (self.order as usize - 1) * PairCodec.record_size()
    }

    /// Serializes `tree` into the file, replacing any previous content.
    pub fn dump(&mut self, tree: &BTree) -> Result<()> {
        if tree.order() != self.order {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!(
                    "tree order {} does not match file order {}",
                    tree.order(),
                    self.order
                ),
            ));
        }
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;

        let codec = PairCodec;
        let order = self.order as usize;
        let mut queue: VecDeque<Option<NodeId>> = VecDeque::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        queue.push_back(Some(tree.root()));
        let mut pending_real = 1usize;
        let mut slots = 0u64;

        while pending_real > 0 {
            let item = queue
                .pop_front()
                .ok_or_else(|| Error::integrity("dump queue drained early".to_string()))?;
            // a node reached twice would loop forever; re-emit it as absent
            let node = match item {
                Some(id) => {
                    pending_real -= 1;
                    if visited.insert(id) { Some(id) } else { None }
                }
                None => None,
            };
            match node {
                Some(id) => {
                    let n = tree.node(id);
                    for slot in &n.entries[..order - 1] {
                        self.file.write_all(&codec.encode(slot.as_ref())?)?;
                    }
                    for child in &n.children[..order] {
                        if child.is_some() {
                            pending_real += 1;
                        }
                        queue.push_back(*child);
                    }
                }
                None => {
                    self.file.write_all(&vec![0u8; self.slot_size()])?;
                    for _ in 0..order {
                        queue.push_back(None);
                    }
                }
            }
            slots += 1;
        }

        // drop whatever the breadth-first walk did not reach
        self.file.set_len(slots * self.slot_size() as u64)?;
        debug!("dumped ordered index: {} slots of {} bytes", slots, self.slot_size());
        Ok(())
    }

    /// Direct-from-disk key lookup.
    pub fn find(&mut self, key: u32) -> Result<Option<u32>> {
        let codec = PairCodec;
        let per_slot = self.order as usize - 1;
        let pair_size = codec.record_size();
        let mut slot: u64 = 0;

        loop {
            self.file.seek(SeekFrom::Start(slot * self.slot_size() as u64))?;
            let mut buf = vec![0u8; self.slot_size()];
            match self.file.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let mut entries = Vec::with_capacity(per_slot);
            for i in 0..per_slot {
                entries.push(codec.decode(&buf[i * pair_size..(i + 1) * pair_size])?);
            }
            // entries fill left to right, so an empty first slot means an
            // absent node (a placeholder, or a leaf's missing child)
            if entries[0].is_none() {
                return Ok(None);
            }

            let mut descend = None;
            for (i, entry) in entries.iter().enumerate() {
                match entry {
                    None => {
                        descend = Some(i);
                        break;
                    }
                    Some(Pair { a, b }) if *a == key => return Ok(Some(*b)),
                    Some(Pair { a, .. }) if *a > key => {
                        descend = Some(i);
                        break;
                    }
                    Some(_) => {}
                }
            }
            // every entry real and below the key: take the rightmost child
            let child = descend.unwrap_or(per_slot);
            slot = self.order as u64 * slot + child as u64 + 1;
        }
    }

    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn dump_and_find(order: u32, keys: &[u32]) {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = BTree::new(order).unwrap();
        for (row, key) in keys.iter().enumerate() {
            tree.insert(*key, row as u32).unwrap();
        }
        let mut file = TreeFile::open(&dir.path().join("ids.btree"), order).unwrap();
        file.dump(&tree).unwrap();

        for (row, key) in keys.iter().enumerate() {
            assert_eq!(file.find(*key).unwrap(), Some(row as u32), "key {}", key);
        }
        let absent = keys.iter().max().unwrap() + 1;
        assert_eq!(file.find(absent).unwrap(), None);
    }

    #[test]
    fn scenario_order_three() {
        let keys = [5u32, 3, 8, 1, 4, 7, 2, 6];
        dump_and_find(3, &keys);

        // the same ids, with the two probes spelled out
        let dir = tempfile::tempdir().unwrap();
        let mut tree = BTree::new(3).unwrap();
        for (row, key) in keys.iter().enumerate() {
            tree.insert(*key, row as u32).unwrap();
        }
        let mut file = TreeFile::open(&dir.path().join("scenario.btree"), 3).unwrap();
        file.dump(&tree).unwrap();
        assert_eq!(file.find(4).unwrap(), Some(4));
        assert_eq!(file.find(9).unwrap(), None);
    }

    #[test]
    fn even_and_odd_orders_round_trip() {
        let keys: Vec<u32> = (1..=50).collect();
        for order in [3u32, 4, 5, 8] {
            dump_and_find(order, &keys);
        }
    }

    #[test]
    fn shuffled_bulk_round_trip() {
        let mut keys: Vec<u32> = (1..=500).map(|k| k * 3).collect();
        keys.shuffle(&mut rand::thread_rng());
        dump_and_find(7, &keys);
    }

    #[test]
    fn missing_keys_between_present_ones() {
        let keys = [10u32, 20, 30, 40, 50, 60, 70];
        let dir = tempfile::tempdir().unwrap();
        let mut tree = BTree::new(3).unwrap();
        for (row, key) in keys.iter().enumerate() {
            tree.insert(*key, row as u32).unwrap();
        }
        let mut file = TreeFile::open(&dir.path().join("gaps.btree"), 3).unwrap();
        file.dump(&tree).unwrap();
        for missing in [5u32, 15, 25, 35, 45, 55, 65, 75] {
            assert_eq!(file.find(missing).unwrap(), None, "key {}", missing);
        }
    }

    #[test]
    fn empty_tree_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tree = BTree::new(3).unwrap();
        let mut file = TreeFile::open(&dir.path().join("empty.btree"), 3).unwrap();
        file.dump(&tree).unwrap();
        assert_eq!(file.find(1).unwrap(), None);
    }

    #[test]
    fn dump_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redump.btree");
        let mut file = TreeFile::open(&path, 3).unwrap();

        let mut first = BTree::new(3).unwrap();
        for key in 1..=20u32 {
            first.insert(key, key).unwrap();
        }
        file.dump(&first).unwrap();

        let mut second = BTree::new(3).unwrap();
        second.insert(99, 1).unwrap();
        file.dump(&second).unwrap();

        assert_eq!(file.find(99).unwrap(), Some(1));
        assert_eq!(file.find(5).unwrap(), None);
    }

    #[test]
    fn order_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tree = BTree::new(5).unwrap();
        let mut file = TreeFile::open(&dir.path().join("bad.btree"), 3).unwrap();
        assert_eq!(
            file.dump(&tree).unwrap_err().kind,
            ErrorKind::InvalidArgument
        );
    }
}
