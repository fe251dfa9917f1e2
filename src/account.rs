use serde::{Deserialize, Serialize};

use crate::crypto::AccountId;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

/// Account-root fields this subsystem reads and updates.
///
/// `owner_count` backs the reserve schedule: it moves by one per directory
/// page or offer the account gains or loses, never per NFT. `minted_tokens`
/// is the strictly monotonic per-issuer mint sequence; `burned_tokens`
/// only ever grows. `minter` is the account, if any, authorized to mint on
/// this account's behalf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    pub balance: u64,
    pub sequence: u32,
    pub owner_count: u32,
    pub minted_tokens: u32,
    pub burned_tokens: u32,
    pub minter: Option<AccountId>,
}

impl AccountRoot {
    pub fn new(balance: u64) -> Self {
        AccountRoot {
            balance,
            ..Default::default()
        }
    }
}

impl Serializer for AccountRoot {
    fn write(&self, writer: &mut Writer) {
        self.balance.write(writer);
        self.sequence.write(writer);
        self.owner_count.write(writer);
        self.minted_tokens.write(writer);
        self.burned_tokens.write(writer);
        self.minter.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountRoot {
            balance: u64::read(reader)?,
            sequence: u32::read(reader)?,
            owner_count: u32::read(reader)?,
            minted_tokens: u32::read(reader)?,
            burned_tokens: u32::read(reader)?,
            minter: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.balance.size()
            + self.sequence.size()
            + self.owner_count.size()
            + self.minted_tokens.size()
            + self.burned_tokens.size()
            + self.minter.size()
    }
}
