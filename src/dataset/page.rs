//! Page codec.
//!
//! An uncompressed page is laid out as:
//!
//! ```text
//! u32 LE bitmap length | presence bitmap (LSB-first, 1 = present) | values
//! ```
//!
//! Integers are zig-zag varints (delta encoding stores the difference from the
//! previous present value); strings are a varint length followed by UTF-8
//! bytes. The whole buffer is then compressed and checksummed.

use std::io::Cursor;

use arrow::array::{Array, Int64Array, StringArray};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use super::config::{CompressionType, EncodingType};
use super::error::DatasetError;
use super::value::{Value, ValueType};

/// Metadata describing one encoded page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Rows in the page, including nulls
    pub rows_count: usize,
    /// Non-null values in the page
    pub values_count: usize,
    /// Size of the page before compression
    pub uncompressed_size: usize,
    /// Size of the stored page bytes
    pub compressed_size: usize,
    /// CRC32 of the stored page bytes
    pub crc32: u32,
    /// Type of the values in the page
    pub value_type: ValueType,
    /// Value encoding
    pub encoding: EncodingType,
    /// Compression of the stored bytes
    pub compression: CompressionType,
}

/// An encoded page of column values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page metadata
    pub info: PageInfo,
    /// Stored (compressed) page bytes
    pub data: Bytes,
}

/// Finished page contents, ready to be encoded
pub(super) enum PageValues<'a> {
    Int64(&'a Int64Array),
    String(&'a StringArray),
}

impl PageValues<'_> {
    fn len(&self) -> usize {
        match self {
            PageValues::Int64(a) => a.len(),
            PageValues::String(a) => a.len(),
        }
    }

    fn is_valid(&self, i: usize) -> bool {
        match self {
            PageValues::Int64(a) => a.is_valid(i),
            PageValues::String(a) => a.is_valid(i),
        }
    }

    fn value_type(&self) -> ValueType {
        match self {
            PageValues::Int64(_) => ValueType::Int64,
            PageValues::String(_) => ValueType::String,
        }
    }
}

impl Page {
    /// Encode finished values into a page
    pub(super) fn encode(
        values: PageValues<'_>,
        encoding: EncodingType,
        compression: CompressionType,
    ) -> Result<Page, DatasetError> {
        let rows = values.len();
        let mut bitmap = vec![0u8; (rows + 7) / 8];
        let mut values_count = 0;
        for i in 0..rows {
            if values.is_valid(i) {
                bitmap[i / 8] |= 1 << (i % 8);
                values_count += 1;
            }
        }

        let mut buf = BytesMut::with_capacity(4 + bitmap.len() + values_count * 8);
        buf.put_u32_le(bitmap.len() as u32);
        buf.put_slice(&bitmap);

        match (&values, encoding) {
            (PageValues::Int64(array), EncodingType::Delta) => {
                let mut prev = 0i64;
                for v in array.iter().flatten() {
                    put_varint(&mut buf, v.wrapping_sub(prev));
                    prev = v;
                }
            }
            (PageValues::Int64(array), EncodingType::Plain) => {
                for v in array.iter().flatten() {
                    put_varint(&mut buf, v);
                }
            }
            (PageValues::String(array), EncodingType::Plain) => {
                for v in array.iter().flatten() {
                    put_uvarint(&mut buf, v.len() as u64);
                    buf.put_slice(v.as_bytes());
                }
            }
            (PageValues::String(_), EncodingType::Delta) => {
                return Err(DatasetError::CorruptPage(
                    "delta encoding requires int64 values".into(),
                ));
            }
        }

        let uncompressed_size = buf.len();
        let data: Bytes = match compression {
            CompressionType::None => buf.freeze(),
            CompressionType::Zstd { level } => {
                zstd::stream::encode_all(Cursor::new(&buf[..]), level)?.into()
            }
        };

        Ok(Page {
            info: PageInfo {
                rows_count: rows,
                values_count,
                uncompressed_size,
                compressed_size: data.len(),
                crc32: crc32fast::hash(&data),
                value_type: values.value_type(),
                encoding,
                compression,
            },
            data,
        })
    }

    /// Decode the page into one value per row, with [`Value::Null`] for absent
    /// rows.
    pub fn decode(&self) -> Result<Vec<Value>, DatasetError> {
        let actual = crc32fast::hash(&self.data);
        if actual != self.info.crc32 {
            return Err(DatasetError::ChecksumMismatch {
                expected: self.info.crc32,
                actual,
            });
        }

        let raw: Bytes = match self.info.compression {
            CompressionType::None => self.data.clone(),
            CompressionType::Zstd { .. } => {
                zstd::stream::decode_all(Cursor::new(&self.data[..]))?.into()
            }
        };
        let mut buf = &raw[..];

        if buf.remaining() < 4 {
            return Err(DatasetError::CorruptPage("missing bitmap header".into()));
        }
        let bitmap_len = buf.get_u32_le() as usize;
        if buf.remaining() < bitmap_len || bitmap_len * 8 < self.info.rows_count {
            return Err(DatasetError::CorruptPage(format!(
                "bitmap of {bitmap_len} bytes cannot hold {} rows",
                self.info.rows_count
            )));
        }
        let bitmap = buf.copy_to_bytes(bitmap_len);

        let mut out = Vec::with_capacity(self.info.rows_count);
        let mut prev = 0i64;
        for i in 0..self.info.rows_count {
            if bitmap[i / 8] & (1 << (i % 8)) == 0 {
                out.push(Value::Null);
                continue;
            }
            let value = match (self.info.value_type, self.info.encoding) {
                (ValueType::Int64, EncodingType::Delta) => {
                    prev = prev.wrapping_add(get_varint(&mut buf)?);
                    Value::Int64(prev)
                }
                (ValueType::Int64, EncodingType::Plain) => Value::Int64(get_varint(&mut buf)?),
                (ValueType::String, EncodingType::Plain) => {
                    let len = get_uvarint(&mut buf)? as usize;
                    if buf.remaining() < len {
                        return Err(DatasetError::CorruptPage("truncated string".into()));
                    }
                    let bytes = buf.copy_to_bytes(len);
                    let s = std::str::from_utf8(&bytes)
                        .map_err(|e| DatasetError::CorruptPage(e.to_string()))?;
                    Value::String(s.to_string())
                }
                (ValueType::String, EncodingType::Delta) => {
                    return Err(DatasetError::CorruptPage(
                        "delta encoding requires int64 values".into(),
                    ));
                }
            };
            out.push(value);
        }

        if buf.has_remaining() {
            return Err(DatasetError::CorruptPage(format!(
                "{} trailing bytes",
                buf.remaining()
            )));
        }
        Ok(out)
    }
}

fn put_uvarint(buf: &mut BytesMut, mut v: u64) {
    while v >= 0x80 {
        buf.put_u8((v as u8) | 0x80);
        v >>= 7;
    }
    buf.put_u8(v as u8);
}

fn put_varint(buf: &mut BytesMut, v: i64) {
    put_uvarint(buf, ((v << 1) ^ (v >> 63)) as u64);
}

fn get_uvarint(buf: &mut &[u8]) -> Result<u64, DatasetError> {
    let mut result = 0u64;
    for shift in (0..64).step_by(7) {
        if !buf.has_remaining() {
            return Err(DatasetError::CorruptPage("truncated varint".into()));
        }
        let byte = buf.get_u8();
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(DatasetError::CorruptPage("varint overflows 64 bits".into()))
}

fn get_varint(buf: &mut &[u8]) -> Result<i64, DatasetError> {
    let u = get_uvarint(buf)?;
    Ok(((u >> 1) as i64) ^ -((u & 1) as i64))
}

/// Bytes a value adds to a page before compression
pub(super) fn encoded_len(value: &Value) -> usize {
    fn uvarint_len(mut v: u64) -> usize {
        let mut n = 1;
        while v >= 0x80 {
            v >>= 7;
            n += 1;
        }
        n
    }
    match value {
        Value::Null => 0,
        Value::Int64(_) => 8,
        Value::String(s) => uvarint_len(s.len() as u64) + s.len(),
    }
}
