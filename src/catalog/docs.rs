use crate::codec::record::RecordCodec;
use crate::core::error::Result;
use crate::index::btree::BTree;
use crate::index::tree_file::TreeFile;
use crate::storage::layout::StorageLayout;
use crate::storage::table::TableFile;

/// One document type's storage: its record table plus the persistent ordered
/// index mapping document id to row.
pub struct DocStore<C: RecordCodec> {
    table: TableFile<C>,
    tree: TreeFile,
    order: u32,
}

impl<C: RecordCodec> DocStore<C> {
    pub fn open(layout: &StorageLayout, name: &str, codec: C, order: u32) -> Result<Self> {
        let table = TableFile::open(&layout.table_path(name), codec)?;
        let tree = TreeFile::open(&layout.tree_path(name), order)?;
        Ok(DocStore { table, tree, order })
    }

    /// Wholesale rebuild: truncate, append every record, and dump a fresh
    /// id-to-row index. `side` runs once per inserted record so the caller
    /// can feed its inverted indexes in the same pass.
    pub fn rebuild<F>(
        &mut self,
        records: &[C::Record],
        id_of: impl Fn(&C::Record) -> u32,
        mut side: F,
    ) -> Result<()>
    where
        F: FnMut(u32, &C::Record) -> Result<()>,
    {
        self.table.truncate()?;
        let mut ids = BTree::new(self.order)?;
        for record in records {
            let row = self.table.insert(record)?;
            ids.insert(id_of(record), row)?;
            side(row, record)?;
        }
        self.tree.dump(&ids)
    }

    /// Key lookup: resolve the id through the ordered index, then load the
    /// row. Absent ids are a normal outcome.
    pub fn get(&mut self, id: u32) -> Result<Option<C::Record>> {
        match self.tree.find(id)? {
            Some(row) => self.table.load(row),
            None => Ok(None),
        }
    }

    pub fn load(&mut self, row: u32) -> Result<Option<C::Record>> {
        self.table.load(row)
    }

    pub fn close(self) -> Result<()> {
        self.table.close()?;
        self.tree.close()
    }
}
