use serde::{Deserialize, Serialize};

use crate::codec::record::{FieldReader, FieldWriter, RecordCodec};
use crate::core::error::{Error, Result};

pub const NAME_LEN: usize = 64;
pub const DESC_LEN: usize = 1024;
pub const COMMENT_LEN: usize = 1024;

fn require_id(id: u32, record: &str) -> Result<()> {
    // an all-zero record is reserved for "no record"
    if id == 0 {
        return Err(Error::integrity(format!(
            "{} id 0 collides with the empty record encoding",
            record
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: u32,
    pub year: u32,
    pub name: String,
    pub description: String,
    pub min_players: u32,
    pub max_players: u32,
    pub min_playtime: u32,
    pub max_playtime: u32,
    pub min_age: u32,
}

pub struct GameCodec;

impl RecordCodec for GameCodec {
    type Record = Game;

    fn record_size(&self) -> usize {
        4 + 4 + NAME_LEN + DESC_LEN + 4 * 5
    }

    fn encode(&self, record: Option<&Game>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        if let Some(game) = record {
            require_id(game.id, "game")?;
            writer.put_u32(game.id);
            writer.put_u32(game.year);
            writer.put_str(&game.name, NAME_LEN);
            writer.put_str(&game.description, DESC_LEN);
            writer.put_u32(game.min_players);
            writer.put_u32(game.max_players);
            writer.put_u32(game.min_playtime);
            writer.put_u32(game.max_playtime);
            writer.put_u32(game.min_age);
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Game>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let id = reader.take_u32();
        if id == 0 {
            return Ok(None);
        }
        Ok(Some(Game {
            id,
            year: reader.take_u32(),
            name: reader.take_str(NAME_LEN)?,
            description: reader.take_str(DESC_LEN)?,
            min_players: reader.take_u32(),
            max_players: reader.take_u32(),
            min_playtime: reader.take_u32(),
            max_playtime: reader.take_u32(),
            min_age: reader.take_u32(),
        }))
    }
}

/// Categories and mechanics share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u32,
    pub name: String,
}

pub struct TagCodec;

impl RecordCodec for TagCodec {
    type Record = Tag;

    fn record_size(&self) -> usize {
        4 + NAME_LEN
    }

    fn encode(&self, record: Option<&Tag>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        if let Some(tag) = record {
            require_id(tag.id, "tag")?;
            writer.put_u32(tag.id);
            writer.put_str(&tag.name, NAME_LEN);
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Tag>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let id = reader.take_u32();
        if id == 0 {
            return Ok(None);
        }
        Ok(Some(Tag {
            id,
            name: reader.take_str(NAME_LEN)?,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: u32,
    pub name: String,
    pub description: String,
}

pub struct PublisherCodec;

impl RecordCodec for PublisherCodec {
    type Record = Publisher;

    fn record_size(&self) -> usize {
        4 + NAME_LEN + DESC_LEN
    }

    fn encode(&self, record: Option<&Publisher>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        if let Some(publisher) = record {
            require_id(publisher.id, "publisher")?;
            writer.put_u32(publisher.id);
            writer.put_str(&publisher.name, NAME_LEN);
            writer.put_str(&publisher.description, DESC_LEN);
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Publisher>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let id = reader.take_u32();
        if id == 0 {
            return Ok(None);
        }
        Ok(Some(Publisher {
            id,
            name: reader.take_str(NAME_LEN)?,
            description: reader.take_str(DESC_LEN)?,
        }))
    }
}

/// A comment belongs to exactly one game or exactly one expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub text: String,
    pub rating: Option<f32>,
    pub game_id: Option<u32>,
    pub expansion_id: Option<u32>,
}

pub struct CommentCodec;

impl RecordCodec for CommentCodec {
    type Record = Comment;

    fn record_size(&self) -> usize {
        4 + COMMENT_LEN + 4 + 4 + 4
    }

    fn encode(&self, record: Option<&Comment>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        if let Some(comment) = record {
            require_id(comment.id, "comment")?;
            match (comment.game_id, comment.expansion_id) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(Error::integrity(format!(
                        "comment {} must reference exactly one owning game or expansion",
                        comment.id
                    )));
                }
            }
            writer.put_u32(comment.id);
            writer.put_str(&comment.text, COMMENT_LEN);
            writer.put_opt_f32(comment.rating, "comment rating")?;
            writer.put_opt_u32(comment.game_id, "comment game id")?;
            writer.put_opt_u32(comment.expansion_id, "comment expansion id")?;
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Comment>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let id = reader.take_u32();
        if id == 0 {
            return Ok(None);
        }
        Ok(Some(Comment {
            id,
            text: reader.take_str(COMMENT_LEN)?,
            rating: reader.take_opt_f32(),
            game_id: reader.take_opt_u32(),
            expansion_id: reader.take_opt_u32(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub year: u32,
}

pub struct ExpansionCodec;

impl RecordCodec for ExpansionCodec {
    type Record = Expansion;

    fn record_size(&self) -> usize {
        4 + NAME_LEN + DESC_LEN + 4
    }

    fn encode(&self, record: Option<&Expansion>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        if let Some(expansion) = record {
            require_id(expansion.id, "expansion")?;
            writer.put_u32(expansion.id);
            writer.put_str(&expansion.name, NAME_LEN);
            writer.put_str(&expansion.description, DESC_LEN);
            writer.put_u32(expansion.year);
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Expansion>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let id = reader.take_u32();
        if id == 0 {
            return Ok(None);
        }
        Ok(Some(Expansion {
            id,
            name: reader.take_str(NAME_LEN)?,
            description: reader.take_str(DESC_LEN)?,
            year: reader.take_u32(),
        }))
    }
}
