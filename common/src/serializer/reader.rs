use thiserror::Error;

use super::Serializer;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Not enough bytes available: requested {requested}, left {left}")]
    NotEnoughBytes { requested: usize, left: usize },

    #[error("Invalid value encountered")]
    InvalidValue,

    #[error("Invalid string encoding")]
    InvalidString,

    #[error("Varint is too large")]
    VarintTooLarge,

    #[error("Trailing bytes after deserialization: {0}")]
    TrailingBytes(usize),
}

// Binary reader over a borrowed byte slice, mirror of Writer
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, position: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ReaderError> {
        if self.position + count > self.bytes.len() {
            return Err(ReaderError::NotEnoughBytes {
                requested: count,
                left: self.bytes.len() - self.position,
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| ReaderError::InvalidValue)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| ReaderError::InvalidValue)?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_u128(&mut self) -> Result<u128, ReaderError> {
        let bytes: [u8; 16] = self.take(16)?.try_into().map_err(|_| ReaderError::InvalidValue)?;
        Ok(u128::from_le_bytes(bytes))
    }

    pub fn read_i16(&mut self) -> Result<i16, ReaderError> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, ReaderError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| ReaderError::InvalidValue)?;
        Ok(i64::from_le_bytes(bytes))
    }

    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    pub fn read_varuint(&mut self) -> Result<u64, ReaderError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(ReaderError::VarintTooLarge);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(ReaderError::VarintTooLarge);
            }
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ReaderError> {
        Ok(self.take(count)?.to_vec())
    }

    pub fn read_bytes_32(&mut self) -> Result<[u8; 32], ReaderError> {
        self.take(32)?.try_into().map_err(|_| ReaderError::InvalidValue)
    }

    pub fn read_bytes_33(&mut self) -> Result<[u8; 33], ReaderError> {
        self.take(33)?.try_into().map_err(|_| ReaderError::InvalidValue)
    }

    pub fn read_bytes_65(&mut self) -> Result<[u8; 65], ReaderError> {
        self.take(65)?.try_into().map_err(|_| ReaderError::InvalidValue)
    }

    pub fn read_string(&mut self) -> Result<String, ReaderError> {
        let size = self.read_varuint()? as usize;
        self.read_string_with_size(size)
    }

    pub fn read_string_with_size(&mut self, size: usize) -> Result<String, ReaderError> {
        let bytes = self.take(size)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ReaderError::InvalidString)
    }

    // Read any type implementing Serializer
    pub fn read<T: Serializer>(&mut self) -> Result<T, ReaderError> {
        T::read(self)
    }

    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn total_read(&self) -> usize {
        self.position
    }

    pub fn left(&self) -> usize {
        self.bytes.len() - self.position
    }
}
