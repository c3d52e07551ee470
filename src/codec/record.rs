use serde::{Deserialize, Serialize};

use crate::codec::text;
use crate::core::error::{Error, ErrorKind, Result};

/// Fixed-width binary codec for one record shape.
///
/// `encode(None)` yields the all-zero "no record" sentinel. Encoding a record
/// whose natural bytes would collide with a reserved sentinel is an integrity
/// fault: the store must fail loudly instead of silently writing a value that
/// decodes as absent.
pub trait RecordCodec {
    type Record;

    fn record_size(&self) -> usize;

    fn encode(&self, record: Option<&Self::Record>) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Option<Self::Record>>;
}

/// Two unsigned words. Ordered-index entries store `(key, row)`, relation
/// tables store `(a_id, b_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub a: u32,
    pub b: u32,
}

pub struct PairCodec;

impl RecordCodec for PairCodec {
    type Record = Pair;

    fn record_size(&self) -> usize {
        8
    }

    fn encode(&self, record: Option<&Pair>) -> Result<Vec<u8>> {
        let mut writer = FieldWriter::new(self.record_size());
        match record {
            Some(pair) => {
                if pair.a == 0 && pair.b == 0 {
                    return Err(Error::integrity(
                        "pair (0, 0) collides with the empty slot encoding".to_string(),
                    ));
                }
                writer.put_u32(pair.a);
                writer.put_u32(pair.b);
            }
            None => {}
        }
        Ok(writer.finish())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<Pair>> {
        let mut reader = FieldReader::new(bytes, self.record_size())?;
        let a = reader.take_u32();
        let b = reader.take_u32();
        if a == 0 && b == 0 {
            return Ok(None);
        }
        Ok(Some(Pair { a, b }))
    }
}

/// Sequential writer over a zeroed fixed-width buffer.
pub(crate) struct FieldWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl FieldWriter {
    pub(crate) fn new(size: usize) -> Self {
        FieldWriter {
            buf: vec![0u8; size],
            pos: 0,
        }
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&value.to_le_bytes());
        self.pos += 4;
    }

    /// Absent values serialize as `u32::MAX`; a present `u32::MAX` would
    /// decode as absent and is rejected.
    pub(crate) fn put_opt_u32(&mut self, value: Option<u32>, field: &str) -> Result<()> {
        match value {
            Some(v) if v == u32::MAX => Err(Error::integrity(format!(
                "{} value {} collides with the absent sentinel",
                field, v
            ))),
            Some(v) => {
                self.put_u32(v);
                Ok(())
            }
            None => {
                self.put_u32(u32::MAX);
                Ok(())
            }
        }
    }

    /// Absent ratings serialize as `f32::MAX`.
    pub(crate) fn put_opt_f32(&mut self, value: Option<f32>, field: &str) -> Result<()> {
        match value {
            Some(v) if v == f32::MAX => Err(Error::integrity(format!(
                "{} value collides with the absent sentinel",
                field
            ))),
            Some(v) => {
                self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
                self.pos += 4;
                Ok(())
            }
            None => {
                self.buf[self.pos..self.pos + 4].copy_from_slice(&f32::MAX.to_le_bytes());
                self.pos += 4;
                Ok(())
            }
        }
    }

    pub(crate) fn put_str(&mut self, text: &str, width: usize) {
        text::pack_str(&mut self.buf[self.pos..self.pos + width], text);
        self.pos += width;
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential reader over a fixed-width buffer.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8], expected: usize) -> Result<Self> {
        if buf.len() != expected {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("expected {} record bytes, got {}", expected, buf.len()),
            ));
        }
        Ok(FieldReader { buf, pos: 0 })
    }

    pub(crate) fn take_u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_le_bytes(raw)
    }

    pub(crate) fn take_opt_u32(&mut self) -> Option<u32> {
        match self.take_u32() {
            u32::MAX => None,
            v => Some(v),
        }
    }

    pub(crate) fn take_opt_f32(&mut self) -> Option<f32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        let value = f32::from_le_bytes(raw);
        if value == f32::MAX { None } else { Some(value) }
    }

    pub(crate) fn take_str(&mut self, width: usize) -> Result<String> {
        let text = text::unpack_str(&self.buf[self.pos..self.pos + width])?;
        self.pos += width;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_round_trip() {
        let codec = PairCodec;
        let bytes = codec.encode(Some(&Pair { a: 7, b: 0 })).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(codec.decode(&bytes).unwrap(), Some(Pair { a: 7, b: 0 }));
    }

    #[test]
    fn absent_pair_is_all_zero() {
        let codec = PairCodec;
        let bytes = codec.encode(None).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
        assert_eq!(codec.decode(&bytes).unwrap(), None);
    }

    #[test]
    fn zero_pair_is_rejected() {
        let codec = PairCodec;
        let err = codec.encode(Some(&Pair { a: 0, b: 0 })).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Integrity);
    }

    #[test]
    fn optional_u32_sentinel_is_rejected() {
        let mut writer = FieldWriter::new(4);
        let err = writer.put_opt_u32(Some(u32::MAX), "id").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Integrity);
    }
}
