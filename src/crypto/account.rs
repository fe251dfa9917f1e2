use crate::serializer::{Reader, ReaderError, Serializer, Writer};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

pub const ACCOUNT_ID_SIZE: usize = 20; // 20 bytes / 160 bits

/// On-ledger account identifier. Accounts are opaque to this subsystem; the
/// identifier also forms the high 160 bits of every directory page key.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_SIZE]);

impl AccountId {
    pub const fn new(bytes: [u8; ACCOUNT_ID_SIZE]) -> Self {
        AccountId(bytes)
    }

    pub const fn zero() -> Self {
        AccountId::new([0; ACCOUNT_ID_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; ACCOUNT_ID_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for AccountId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ACCOUNT_ID_SIZE] = bytes.try_into().map_err(|_| "Invalid account id")?;
        Ok(AccountId::new(bytes))
    }
}

impl Serializer for AccountId {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountId::new(reader.read_bytes_20()?))
    }

    fn size(&self) -> usize {
        ACCOUNT_ID_SIZE
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != ACCOUNT_ID_SIZE * 2 {
            return Err(SerdeError::custom("Invalid hex length"));
        }

        let decoded_hex = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; ACCOUNT_ID_SIZE] = decoded_hex
            .try_into()
            .map_err(|_| SerdeError::custom("Could not transform hex to account id"))?;
        Ok(AccountId::new(bytes))
    }
}
