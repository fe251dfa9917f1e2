use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

// Native KEEL asset (zero hash); every other asset hash is an issued asset
// managed by the asset registry and held through trust lines.
pub const NATIVE_ASSET: Hash = Hash::zero();

/// A quantity of a single asset. Comparisons between amounts only make sense
/// for matching assets; callers check asset equality explicitly first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    asset: Hash,
    value: u64,
}

impl Amount {
    pub fn new(asset: Hash, value: u64) -> Self {
        Amount { asset, value }
    }

    /// An amount of the native asset, in drops.
    pub fn native(value: u64) -> Self {
        Amount {
            asset: NATIVE_ASSET,
            value,
        }
    }

    #[inline]
    pub fn asset(&self) -> &Hash {
        &self.asset
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        self.asset == NATIVE_ASSET
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Same asset, different value.
    pub fn with_value(&self, value: u64) -> Self {
        Amount {
            asset: self.asset.clone(),
            value,
        }
    }
}

impl Serializer for Amount {
    fn write(&self, writer: &mut Writer) {
        self.asset.write(writer);
        self.value.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Amount {
            asset: Hash::read(reader)?,
            value: u64::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.asset.size() + self.value.size()
    }
}

/// State of a trust line between an account and an issued asset.
/// Lines are created and administered by the generic trust-line subsystem;
/// this subsystem only reads them and moves balances through `send`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    pub balance: u64,
    pub frozen: bool,
}

impl TrustLine {
    pub fn new(balance: u64) -> Self {
        TrustLine {
            balance,
            frozen: false,
        }
    }
}
