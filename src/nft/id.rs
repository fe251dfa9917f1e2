// Token identifier codec.
//
// A token id packs, most significant first: flags (u16), transfer fee
// (u16), issuer (160 bits), ciphered taxon (u32), mint sequence (u32).
// The packing is big-endian, so ids order lexicographically with the
// issuer dominant after flags/fee and the sequence finest.

use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use crate::crypto::{AccountId, ACCOUNT_ID_SIZE};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const TOKEN_ID_SIZE: usize = 32;

// Number of low-order bytes masked off when grouping ids into directory
// pages: 96 bits covering the low 4 issuer bytes, the taxon and the
// sequence. Ids agreeing on everything above these bytes share a page.
const PAGE_MASK_BYTES: usize = 12;

// Taxon cipher. An issuer may mint many tokens with one taxon; mixing the
// taxon with an LCG keyed by the mint sequence spreads siblings across the
// page space instead of clustering them on one page.
const TAXON_LCG_MULTIPLIER: u32 = 384_160_001;
const TAXON_LCG_INCREMENT: u32 = 2_459;

/// Cipher (and decipher: XOR is its own inverse) a taxon with the keystream
/// derived from the mint sequence.
pub fn cipher_taxon(sequence: u32, taxon: u32) -> u32 {
    taxon
        ^ sequence
            .wrapping_mul(TAXON_LCG_MULTIPLIER)
            .wrapping_add(TAXON_LCG_INCREMENT)
}

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug, Hash)]
pub struct TokenId([u8; TOKEN_ID_SIZE]);

impl TokenId {
    pub const fn new(bytes: [u8; TOKEN_ID_SIZE]) -> Self {
        TokenId(bytes)
    }

    /// Build the identifier of a freshly minted token.
    /// Bijective with the input tuple: the extractors below recover every
    /// field, including the plaintext taxon.
    pub fn compose(
        flags: u16,
        transfer_fee: u16,
        issuer: &AccountId,
        taxon: u32,
        sequence: u32,
    ) -> Self {
        let mut bytes = [0u8; TOKEN_ID_SIZE];
        bytes[0..2].copy_from_slice(&flags.to_be_bytes());
        bytes[2..4].copy_from_slice(&transfer_fee.to_be_bytes());
        bytes[4..24].copy_from_slice(issuer.as_bytes());
        bytes[24..28].copy_from_slice(&cipher_taxon(sequence, taxon).to_be_bytes());
        bytes[28..32].copy_from_slice(&sequence.to_be_bytes());
        TokenId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    pub fn transfer_fee(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    pub fn issuer(&self) -> AccountId {
        let mut bytes = [0u8; ACCOUNT_ID_SIZE];
        bytes.copy_from_slice(&self.0[4..24]);
        AccountId::new(bytes)
    }

    pub fn sequence(&self) -> u32 {
        u32::from_be_bytes([self.0[28], self.0[29], self.0[30], self.0[31]])
    }

    /// The issuer-supplied taxon, deciphered with the recovered sequence.
    pub fn taxon(&self) -> u32 {
        let ciphered = u32::from_be_bytes([self.0[24], self.0[25], self.0[26], self.0[27]]);
        cipher_taxon(self.sequence(), ciphered)
    }

    /// The low 96 bits: the id's page-equivalence class. Ids with equal low
    /// bits must live on the same directory page, and pages sort their
    /// tokens by this value.
    pub fn low_bits(&self) -> [u8; PAGE_MASK_BYTES] {
        let mut bytes = [0u8; PAGE_MASK_BYTES];
        bytes.copy_from_slice(&self.0[TOKEN_ID_SIZE - PAGE_MASK_BYTES..]);
        bytes
    }
}

impl FromStr for TokenId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; TOKEN_ID_SIZE] = bytes.try_into().map_err(|_| "Invalid token id")?;
        Ok(TokenId::new(bytes))
    }
}

impl Serializer for TokenId {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(TokenId::new(reader.read_bytes_32()?))
    }

    fn size(&self) -> usize {
        TOKEN_ID_SIZE
    }
}

impl AsRef<[u8]> for TokenId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for TokenId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != TOKEN_ID_SIZE * 2 {
            return Err(SerdeError::custom("Invalid hex length"));
        }

        let decoded_hex = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; TOKEN_ID_SIZE] = decoded_hex
            .try_into()
            .map_err(|_| SerdeError::custom("Could not transform hex to token id"))?;
        Ok(TokenId::new(bytes))
    }
}
