use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,
    pub tree_order: u32,          // max children per ordered-index node
    pub word_buckets: u32,        // nominal bucket count, word-search indexes
    pub relation_buckets: u32,    // nominal bucket count, id-keyed indexes
    pub posting_block_size: u32,  // values per posting-list block
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            tree_order: 31,               // matches a 248-byte tree-file slot
            word_buckets: 4096,
            relation_buckets: 1024,
            posting_block_size: 8,
        }
    }
}
