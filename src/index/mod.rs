pub mod btree;
pub mod inverted;
pub mod key;
pub mod tree_file;
