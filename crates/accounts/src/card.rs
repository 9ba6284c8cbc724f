//! Cards and card numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

use subledger_core::{CardId, Entity, ValueObject};

use crate::error::{AccountError, AccountResult};

/// A card number: an opaque digit string, compared by its digits.
///
/// Display formatting (groups of four) is presentation only and irrelevant to
/// domain logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn new(digits: impl Into<String>) -> AccountResult<Self> {
        let digits = digits.into();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountError::validation(format!(
                "card number must be a non-empty digit string, got {digits:?}"
            )));
        }
        Ok(Self(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CardNumber {}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.0.as_bytes().chunks(4).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            // Chunks of an all-digit string are valid UTF-8.
            f.write_str(core::str::from_utf8(chunk).map_err(|_| fmt::Error)?)?;
        }
        Ok(())
    }
}

/// A magnetic stripe card. Cards exist independently of accounts; a card
/// sub-account holds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    number: CardNumber,
}

impl Card {
    pub fn new(number: CardNumber) -> Self {
        Self {
            id: CardId::new(),
            number,
        }
    }

    /// Rebuild a card from stored parts (repository rehydration).
    pub fn from_parts(id: CardId, number: CardNumber) -> Self {
        Self { id, number }
    }

    pub fn number(&self) -> &CardNumber {
        &self.number
    }
}

impl Entity for Card {
    type Id = CardId;

    fn id(&self) -> &CardId {
        &self.id
    }
}
