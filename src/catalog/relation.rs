use crate::codec::record::{Pair, PairCodec};
use crate::core::error::Result;
use crate::index::inverted::InvertedIndex;
use crate::storage::layout::StorageLayout;
use crate::storage::table::TableFile;

/// A many-to-many relation: a table of `(a, b)` id pairs plus one inverted
/// index per side, each mapping a side's id to the relation rows it appears
/// in. Walking from an id to its partners is index lookup then row loads.
pub struct RelationStore {
    table: TableFile<PairCodec>,
    by_a: InvertedIndex<u32>,
    by_b: InvertedIndex<u32>,
}

impl RelationStore {
    pub fn open(
        layout: &StorageLayout,
        name: &str,
        side_a: &str,
        side_b: &str,
        buckets: u32,
        block_size: u32,
    ) -> Result<Self> {
        let table = TableFile::open(&layout.table_path(name), PairCodec)?;
        let a_name = format!("{}_{}", name, side_a);
        let b_name = format!("{}_{}", name, side_b);
        let by_a = InvertedIndex::open(
            &layout.posting_path(&a_name),
            &layout.dictionary_path(&a_name),
            buckets,
            block_size,
            false,
        )?;
        let by_b = InvertedIndex::open(
            &layout.posting_path(&b_name),
            &layout.dictionary_path(&b_name),
            buckets,
            block_size,
            false,
        )?;
        Ok(RelationStore { table, by_a, by_b })
    }

    /// Wholesale rebuild of the pair table and both side indexes.
    pub fn rebuild(&mut self, pairs: &[(u32, u32)]) -> Result<()> {
        self.table.truncate()?;
        self.by_a.truncate()?;
        self.by_b.truncate()?;
        for &(a, b) in pairs {
            let row = self.table.insert(&Pair { a, b })?;
            self.by_a.insert(&a, row)?;
            self.by_b.insert(&b, row)?;
        }
        Ok(())
    }

    /// Partner ids on the B side for one A-side id.
    pub fn partners_of_a(&mut self, a: u32) -> Result<Vec<u32>> {
        let mut partners = Vec::new();
        for row in self.by_a.get(&a)? {
            if let Some(pair) = self.table.load(row)? {
                partners.push(pair.b);
            }
        }
        Ok(partners)
    }

    /// Partner ids on the A side for one B-side id.
    pub fn partners_of_b(&mut self, b: u32) -> Result<Vec<u32>> {
        let mut partners = Vec::new();
        for row in self.by_b.get(&b)? {
            if let Some(pair) = self.table.load(row)? {
                partners.push(pair.a);
            }
        }
        Ok(partners)
    }

    pub fn close(self) -> Result<()> {
        self.table.close()?;
        self.by_a.close()?;
        self.by_b.close()
    }
}
