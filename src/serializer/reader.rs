use thiserror::Error;

use super::Serializer;
use crate::crypto::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("Not enough bytes to read")]
    InvalidSize,

    #[error("Invalid value encountered")]
    InvalidValue,

    #[error("Invalid hex input")]
    InvalidHex,
}

/// Cursor over the canonical byte encoding of an object.
/// All multi-byte integers are read big-endian.
pub struct Reader<'a> {
    bytes: &'a [u8],
    total: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, total: 0 }
    }

    /// Read any `Serializer` type from the current position.
    pub fn read<T: Serializer>(&mut self) -> Result<T, ReaderError> {
        T::read(self)
    }

    pub fn read_bytes_ref(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if n > self.bytes.len() - self.total {
            return Err(ReaderError::InvalidSize);
        }
        let bytes = &self.bytes[self.total..self.total + n];
        self.total += n;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReaderError> {
        Ok(self.read_bytes_ref(n)?.to_vec())
    }

    pub fn read_bytes_20(&mut self) -> Result<[u8; 20], ReaderError> {
        let bytes = self.read_bytes_ref(20)?;
        bytes.try_into().map_err(|_| ReaderError::InvalidSize)
    }

    pub fn read_bytes_32(&mut self) -> Result<[u8; 32], ReaderError> {
        let bytes = self.read_bytes_ref(32)?;
        bytes.try_into().map_err(|_| ReaderError::InvalidSize)
    }

    pub fn read_hash(&mut self) -> Result<Hash, ReaderError> {
        Ok(Hash::new(self.read_bytes_32()?))
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        let bytes = self.read_bytes_ref(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        let bytes: [u8; 2] = self
            .read_bytes_ref(2)?
            .try_into()
            .map_err(|_| ReaderError::InvalidSize)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let bytes: [u8; 4] = self
            .read_bytes_ref(4)?
            .try_into()
            .map_err(|_| ReaderError::InvalidSize)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let bytes: [u8; 8] = self
            .read_bytes_ref(8)?
            .try_into()
            .map_err(|_| ReaderError::InvalidSize)?;
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    /// Remaining bytes not yet consumed.
    pub fn size(&self) -> usize {
        self.bytes.len() - self.total
    }

    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn total_read(&self) -> usize {
        self.total
    }
}
