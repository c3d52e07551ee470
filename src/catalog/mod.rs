pub mod docs;
pub mod relation;

use log::info;

use crate::analysis::analyzer::Analyzer;
use crate::catalog::docs::DocStore;
use crate::catalog::relation::RelationStore;
use crate::codec::entities::{
    Comment, CommentCodec, Expansion, ExpansionCodec, Game, GameCodec, Publisher, PublisherCodec,
    Tag, TagCodec,
};
use crate::codec::record::RecordCodec;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::inverted::InvertedIndex;
use crate::index::key::WordKey;
use crate::storage::layout::StorageLayout;

/// The catalog wires one `DocStore` per document type, the word-search and
/// back-reference inverted indexes fed while those stores rebuild, and the
/// four many-to-many relations. A single writer rebuilds a document type or
/// relation wholesale; readers during a rebuild may observe a torn store.
pub struct Catalog {
    analyzer: Analyzer,

    games: DocStore<GameCodec>,
    mechanics: DocStore<TagCodec>,
    categories: DocStore<TagCodec>,
    publishers: DocStore<PublisherCodec>,
    comments: DocStore<CommentCodec>,
    expansions: DocStore<ExpansionCodec>,

    games_word: InvertedIndex<WordKey>,
    mechanics_word: InvertedIndex<WordKey>,
    categories_word: InvertedIndex<WordKey>,
    publishers_word: InvertedIndex<WordKey>,
    comments_game: InvertedIndex<u32>,
    comments_expansion: InvertedIndex<u32>,

    game_mechanic: RelationStore,
    game_category: RelationStore,
    game_publisher: RelationStore,
    game_expansion: RelationStore,
}

fn open_word_index(
    layout: &StorageLayout,
    name: &str,
    config: &Config,
) -> Result<InvertedIndex<WordKey>> {
    InvertedIndex::open(
        &layout.posting_path(name),
        &layout.dictionary_path(name),
        config.word_buckets,
        config.posting_block_size,
        false,
    )
}

fn open_ref_index(
    layout: &StorageLayout,
    name: &str,
    config: &Config,
) -> Result<InvertedIndex<u32>> {
    InvertedIndex::open(
        &layout.posting_path(name),
        &layout.dictionary_path(name),
        config.relation_buckets,
        config.posting_block_size,
        false,
    )
}

fn load_rows<C: RecordCodec>(store: &mut DocStore<C>, rows: Vec<u32>) -> Result<Vec<C::Record>> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(record) = store.load(row)? {
            records.push(record);
        }
    }
    Ok(records)
}

impl Catalog {
    /// Opens (creating as needed) every file the catalog owns. Handles stay
    /// open for the life of the catalog; `close` releases them all.
    pub fn open(config: Config) -> Result<Self> {
        let layout = StorageLayout::new(config.storage_path.clone())?;
        let order = config.tree_order;

        Ok(Catalog {
            analyzer: Analyzer::search_english(),

            games: DocStore::open(&layout, "games", GameCodec, order)?,
            mechanics: DocStore::open(&layout, "mechanics", TagCodec, order)?,
            categories: DocStore::open(&layout, "categories", TagCodec, order)?,
            publishers: DocStore::open(&layout, "publishers", PublisherCodec, order)?,
            comments: DocStore::open(&layout, "comments", CommentCodec, order)?,
            expansions: DocStore::open(&layout, "expansions", ExpansionCodec, order)?,

            games_word: open_word_index(&layout, "games_word", &config)?,
            mechanics_word: open_word_index(&layout, "mechanics_word", &config)?,
            categories_word: open_word_index(&layout, "categories_word", &config)?,
            publishers_word: open_word_index(&layout, "publishers_word", &config)?,
            comments_game: open_ref_index(&layout, "comments_game", &config)?,
            comments_expansion: open_ref_index(&layout, "comments_expansion", &config)?,

            game_mechanic: RelationStore::open(
                &layout,
                "game_mechanic",
                "game",
                "mechanic",
                config.relation_buckets,
                config.posting_block_size,
            )?,
            game_category: RelationStore::open(
                &layout,
                "game_category",
                "game",
                "category",
                config.relation_buckets,
                config.posting_block_size,
            )?,
            game_publisher: RelationStore::open(
                &layout,
                "game_publisher",
                "game",
                "publisher",
                config.relation_buckets,
                config.posting_block_size,
            )?,
            game_expansion: RelationStore::open(
                &layout,
                "game_expansion",
                "game",
                "expansion",
                config.relation_buckets,
                config.posting_block_size,
            )?,
        })
    }

    // --- rebuilds -------------------------------------------------------

    pub fn rebuild_games(&mut self, games: &[Game]) -> Result<()> {
        self.games_word.truncate()?;
        let analyzer = &self.analyzer;
        let words = &mut self.games_word;
        self.games.rebuild(games, |g| g.id, |row, game| {
            for word in analyzer.analyze(&game.name) {
                words.insert(&WordKey(word), row)?;
            }
            for word in analyzer.analyze(&game.description) {
                words.insert(&WordKey(word), row)?;
            }
            Ok(())
        })?;
        info!("rebuilt games: {} records", games.len());
        Ok(())
    }

    pub fn rebuild_mechanics(&mut self, tags: &[Tag]) -> Result<()> {
        self.mechanics_word.truncate()?;
        let analyzer = &self.analyzer;
        let words = &mut self.mechanics_word;
        self.mechanics.rebuild(tags, |t| t.id, |row, tag| {
            for word in analyzer.analyze(&tag.name) {
                words.insert(&WordKey(word), row)?;
            }
            Ok(())
        })?;
        info!("rebuilt mechanics: {} records", tags.len());
        Ok(())
    }

    pub fn rebuild_categories(&mut self, tags: &[Tag]) -> Result<()> {
        self.categories_word.truncate()?;
        let analyzer = &self.analyzer;
        let words = &mut self.categories_word;
        self.categories.rebuild(tags, |t| t.id, |row, tag| {
            for word in analyzer.analyze(&tag.name) {
                words.insert(&WordKey(word), row)?;
            }
            Ok(())
        })?;
        info!("rebuilt categories: {} records", tags.len());
        Ok(())
    }

    pub fn rebuild_publishers(&mut self, publishers: &[Publisher]) -> Result<()> {
        self.publishers_word.truncate()?;
        let analyzer = &self.analyzer;
        let words = &mut self.publishers_word;
        self.publishers.rebuild(publishers, |p| p.id, |row, publisher| {
            for word in analyzer.analyze(&publisher.name) {
                words.insert(&WordKey(word), row)?;
            }
            for word in analyzer.analyze(&publisher.description) {
                words.insert(&WordKey(word), row)?;
            }
            Ok(())
        })?;
        info!("rebuilt publishers: {} records", publishers.len());
        Ok(())
    }

    /// Comments index back into their owner: one posting list per game and
    /// per expansion. The codec rejects a comment that names neither owner
    /// (or both), which aborts the rebuild.
    pub fn rebuild_comments(&mut self, comments: &[Comment]) -> Result<()> {
        self.comments_game.truncate()?;
        self.comments_expansion.truncate()?;
        let by_game = &mut self.comments_game;
        let by_expansion = &mut self.comments_expansion;
        self.comments.rebuild(comments, |c| c.id, |row, comment| {
            if let Some(game_id) = comment.game_id {
                by_game.insert(&game_id, row)?;
            }
            if let Some(expansion_id) = comment.expansion_id {
                by_expansion.insert(&expansion_id, row)?;
            }
            Ok(())
        })?;
        info!("rebuilt comments: {} records", comments.len());
        Ok(())
    }

    pub fn rebuild_expansions(&mut self, expansions: &[Expansion]) -> Result<()> {
        self.expansions.rebuild(expansions, |e| e.id, |_, _| Ok(()))?;
        info!("rebuilt expansions: {} records", expansions.len());
        Ok(())
    }

    pub fn rebuild_game_mechanics(&mut self, pairs: &[(u32, u32)]) -> Result<()> {
        self.game_mechanic.rebuild(pairs)?;
        info!("rebuilt game_mechanic: {} pairs", pairs.len());
        Ok(())
    }

    pub fn rebuild_game_categories(&mut self, pairs: &[(u32, u32)]) -> Result<()> {
        self.game_category.rebuild(pairs)?;
        info!("rebuilt game_category: {} pairs", pairs.len());
        Ok(())
    }

    pub fn rebuild_game_publishers(&mut self, pairs: &[(u32, u32)]) -> Result<()> {
        self.game_publisher.rebuild(pairs)?;
        info!("rebuilt game_publisher: {} pairs", pairs.len());
        Ok(())
    }

    pub fn rebuild_game_expansions(&mut self, pairs: &[(u32, u32)]) -> Result<()> {
        self.game_expansion.rebuild(pairs)?;
        info!("rebuilt game_expansion: {} pairs", pairs.len());
        Ok(())
    }

    // --- key lookups ----------------------------------------------------

    pub fn game(&mut self, id: u32) -> Result<Option<Game>> {
        self.games.get(id)
    }

    pub fn mechanic(&mut self, id: u32) -> Result<Option<Tag>> {
        self.mechanics.get(id)
    }

    pub fn category(&mut self, id: u32) -> Result<Option<Tag>> {
        self.categories.get(id)
    }

    pub fn publisher(&mut self, id: u32) -> Result<Option<Publisher>> {
        self.publishers.get(id)
    }

    pub fn comment(&mut self, id: u32) -> Result<Option<Comment>> {
        self.comments.get(id)
    }

    pub fn expansion(&mut self, id: u32) -> Result<Option<Expansion>> {
        self.expansions.get(id)
    }

    // --- word search ----------------------------------------------------

    pub fn games_with_word(&mut self, word: &str) -> Result<Vec<Game>> {
        let rows = self.games_word.get(&WordKey::new(word))?;
        load_rows(&mut self.games, rows)
    }

    pub fn mechanics_with_word(&mut self, word: &str) -> Result<Vec<Tag>> {
        let rows = self.mechanics_word.get(&WordKey::new(word))?;
        load_rows(&mut self.mechanics, rows)
    }

    pub fn categories_with_word(&mut self, word: &str) -> Result<Vec<Tag>> {
        let rows = self.categories_word.get(&WordKey::new(word))?;
        load_rows(&mut self.categories, rows)
    }

    pub fn publishers_with_word(&mut self, word: &str) -> Result<Vec<Publisher>> {
        let rows = self.publishers_word.get(&WordKey::new(word))?;
        load_rows(&mut self.publishers, rows)
    }

    /// Tokenizes the query with the same pipeline the build used and
    /// intersects the per-token posting lists.
    pub fn search_games(&mut self, query: &str) -> Result<Vec<Game>> {
        let words = self.analyzer.analyze(query);
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows: Option<Vec<u32>> = None;
        for word in &words {
            let posting = self.games_word.get(&WordKey::new(word.as_str()))?;
            rows = Some(match rows {
                None => posting,
                Some(prev) => prev.into_iter().filter(|row| posting.contains(row)).collect(),
            });
        }
        load_rows(&mut self.games, rows.unwrap_or_default())
    }

    // --- back references and relations ----------------------------------

    pub fn comments_for_game(&mut self, game_id: u32) -> Result<Vec<Comment>> {
        let rows = self.comments_game.get(&game_id)?;
        load_rows(&mut self.comments, rows)
    }

    pub fn comments_for_expansion(&mut self, expansion_id: u32) -> Result<Vec<Comment>> {
        let rows = self.comments_expansion.get(&expansion_id)?;
        load_rows(&mut self.comments, rows)
    }

    pub fn mechanics_of_game(&mut self, game_id: u32) -> Result<Vec<Tag>> {
        let ids = self.game_mechanic.partners_of_a(game_id)?;
        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tag) = self.mechanics.get(id)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    pub fn categories_of_game(&mut self, game_id: u32) -> Result<Vec<Tag>> {
        let ids = self.game_category.partners_of_a(game_id)?;
        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tag) = self.categories.get(id)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    pub fn publishers_of_game(&mut self, game_id: u32) -> Result<Vec<Publisher>> {
        let ids = self.game_publisher.partners_of_a(game_id)?;
        let mut publishers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(publisher) = self.publishers.get(id)? {
                publishers.push(publisher);
            }
        }
        Ok(publishers)
    }

    pub fn expansions_of_game(&mut self, game_id: u32) -> Result<Vec<Expansion>> {
        let ids = self.game_expansion.partners_of_a(game_id)?;
        let mut expansions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(expansion) = self.expansions.get(id)? {
                expansions.push(expansion);
            }
        }
        Ok(expansions)
    }

    /// Game ids for relation-side filtering; the caller intersects these the
    /// way the search front end does.
    pub fn games_with_mechanic(&mut self, mechanic_id: u32) -> Result<Vec<u32>> {
        self.game_mechanic.partners_of_b(mechanic_id)
    }

    pub fn games_with_category(&mut self, category_id: u32) -> Result<Vec<u32>> {
        self.game_category.partners_of_b(category_id)
    }

    pub fn games_with_publisher(&mut self, publisher_id: u32) -> Result<Vec<u32>> {
        self.game_publisher.partners_of_b(publisher_id)
    }

    // --------------------------------------------------------------------

    /// Syncs and releases every handle. Dropping the catalog also releases
    /// them; `close` additionally surfaces sync failures.
    pub fn close(self) -> Result<()> {
        self.games.close()?;
        self.mechanics.close()?;
        self.categories.close()?;
        self.publishers.close()?;
        self.comments.close()?;
        self.expansions.close()?;
        self.games_word.close()?;
        self.mechanics_word.close()?;
        self.categories_word.close()?;
        self.publishers_word.close()?;
        self.comments_game.close()?;
        self.comments_expansion.close()?;
        self.game_mechanic.close()?;
        self.game_category.close()?;
        self.game_publisher.close()?;
        self.game_expansion.close()
    }
}
