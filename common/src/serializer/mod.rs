mod reader;
mod writer;

use std::collections::BTreeSet;

use indexmap::IndexMap;

pub use reader::{Reader, ReaderError};
pub use writer::{varuint_size, Writer};

// Consensus wire format: every type carried in a transaction or block
// implements this trait. `size` must match the number of bytes `write`
// produces.
pub trait Serializer: Sized {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>;

    fn size(&self) -> usize;

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.size());
        self.write(&mut writer);
        writer.bytes()
    }

    // Strict decode: the payload must be consumed entirely
    fn from_bytes(bytes: &[u8]) -> Result<Self, ReaderError> {
        let mut reader = Reader::new(bytes);
        let value = Self::read(&mut reader)?;
        if reader.left() > 0 {
            return Err(ReaderError::TrailingBytes(reader.left()));
        }
        Ok(value)
    }
}

impl Serializer for u8 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u8()
    }

    fn size(&self) -> usize {
        1
    }
}

impl Serializer for u16 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u16(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u16()
    }

    fn size(&self) -> usize {
        2
    }
}

impl Serializer for u32 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u32()
    }

    fn size(&self) -> usize {
        4
    }
}

impl Serializer for u64 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u64()
    }

    fn size(&self) -> usize {
        8
    }
}

impl Serializer for i16 {
    fn write(&self, writer: &mut Writer) {
        writer.write_i16(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_i16()
    }

    fn size(&self) -> usize {
        2
    }
}

impl Serializer for i64 {
    fn write(&self, writer: &mut Writer) {
        writer.write_i64(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_i64()
    }

    fn size(&self) -> usize {
        8
    }
}

impl Serializer for bool {
    fn write(&self, writer: &mut Writer) {
        writer.write_bool(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_bool()
    }

    fn size(&self) -> usize {
        1
    }
}

impl Serializer for String {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_string()
    }

    fn size(&self) -> usize {
        varuint_size(self.len() as u64) + self.len()
    }
}

impl<T: Serializer> Serializer for Option<T> {
    fn write(&self, writer: &mut Writer) {
        match self {
            None => writer.write_u8(0),
            Some(value) => {
                writer.write_u8(1);
                value.write(writer);
            }
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::read(reader)?)),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    fn size(&self) -> usize {
        match self {
            None => 1,
            Some(value) => 1 + value.size(),
        }
    }
}

impl<T: Serializer> Serializer for Vec<T> {
    fn write(&self, writer: &mut Writer) {
        writer.write_varuint(self.len() as u64);
        for item in self {
            item.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let count = reader.read_varuint()? as usize;
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(T::read(reader)?);
        }
        Ok(items)
    }

    fn size(&self) -> usize {
        varuint_size(self.len() as u64) + self.iter().map(Serializer::size).sum::<usize>()
    }
}

impl<T: Serializer + Ord> Serializer for BTreeSet<T> {
    fn write(&self, writer: &mut Writer) {
        writer.write_varuint(self.len() as u64);
        for item in self {
            item.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let count = reader.read_varuint()? as usize;
        let mut items = BTreeSet::new();
        for _ in 0..count {
            // reject unsorted or duplicate entries to keep encodings canonical
            if !items.insert(T::read(reader)?) {
                return Err(ReaderError::InvalidValue);
            }
        }
        Ok(items)
    }

    fn size(&self) -> usize {
        varuint_size(self.len() as u64) + self.iter().map(Serializer::size).sum::<usize>()
    }
}

impl<K: Serializer + std::hash::Hash + Eq, V: Serializer> Serializer for IndexMap<K, V> {
    fn write(&self, writer: &mut Writer) {
        writer.write_varuint(self.len() as u64);
        for (key, value) in self {
            key.write(writer);
            value.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let count = reader.read_varuint()? as usize;
        let mut map = IndexMap::new();
        for _ in 0..count {
            let key = K::read(reader)?;
            let value = V::read(reader)?;
            if map.insert(key, value).is_some() {
                return Err(ReaderError::InvalidValue);
            }
        }
        Ok(map)
    }

    fn size(&self) -> usize {
        varuint_size(self.len() as u64)
            + self.iter().map(|(k, v)| k.size() + v.size()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varuint_round_trip() {
        for value in [0u64, 1, 127, 128, 300, 16383, 16384, u32::MAX as u64, u64::MAX] {
            let mut writer = Writer::new();
            writer.write_varuint(value);
            assert_eq!(writer.total_write(), varuint_size(value));
            let bytes = writer.bytes();
            let mut reader = Reader::new(&bytes);
            assert_eq!(reader.read_varuint().unwrap(), value);
            assert_eq!(reader.left(), 0);
        }
    }

    #[test]
    fn vec_and_option_round_trip() {
        let value: Vec<Option<String>> = vec![None, Some("ipfs://abc".to_owned()), None];
        let bytes = value.to_bytes();
        assert_eq!(bytes.len(), value.size());
        let decoded = Vec::<Option<String>>::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = 42u64.to_bytes();
        bytes.push(0);
        assert!(matches!(
            u64::from_bytes(&bytes),
            Err(ReaderError::TrailingBytes(1))
        ));
    }
}
