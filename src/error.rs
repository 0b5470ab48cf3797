//! Recoverable failure results for the simulation core.
//!
//! Nothing in the core is fatal to the process. Every fallible operation
//! returns a [`CoreError`] and leaves state exactly as it was, so the caller
//! can pick a different action.
//!
//! ```rust
//! use horde_arena::error::{CoreError, CoreResult};
//!
//! fn pay(balance: u32, cost: u32) -> CoreResult<u32> {
//!     if balance < cost {
//!         return Err(CoreError::InsufficientFunds { cost, balance });
//!     }
//!     Ok(balance - cost)
//! }
//! assert!(pay(5, 10).is_err());
//! ```

use std::fmt;

/// Which item table an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Weapon,
    Passive,
    Enemy,
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemClass::Weapon => "weapon",
            ItemClass::Passive => "passive",
            ItemClass::Enemy => "enemy",
        })
    }
}

/// Top-level error enum for the combat core.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// An id did not match any definition or owned instance.
    NotFound {
        kind: ItemClass,
        id: String,
    },

    /// All equip slots of this class are taken.
    SlotsFull {
        kind: ItemClass,
        limit: usize,
    },

    /// The item is already at its maximum level.
    MaxLevel {
        id: String,
        max_level: u32,
    },

    /// Acquiring an item that is already equipped.
    AlreadyOwned {
        id: String,
    },

    /// The operation is not valid in the current state.
    InvalidState(&'static str),

    /// The player cannot afford the action.
    InsufficientFunds {
        cost: u32,
        balance: u32,
    },

    /// A definition table entry failed load-time validation.
    InvalidDefinition {
        id: String,
        reason: String,
    },

    /// Configuration could not be parsed or is out of range.
    Config(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NotFound { kind, id } => write!(f, "{} '{}' not found", kind, id),
            CoreError::SlotsFull { kind, limit } => {
                write!(f, "all {} {} slots are in use", limit, kind)
            }
            CoreError::MaxLevel { id, max_level } => {
                write!(f, "'{}' is already at max level {}", id, max_level)
            }
            CoreError::AlreadyOwned { id } => write!(f, "'{}' is already equipped", id),
            CoreError::InvalidState(what) => write!(f, "invalid state: {}", what),
            CoreError::InsufficientFunds { cost, balance } => write!(
                f,
                "insufficient funds: need {}, have {}",
                cost, balance
            ),
            CoreError::InvalidDefinition { id, reason } => {
                write!(f, "invalid definition '{}': {}", id, reason)
            }
            CoreError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

/// Convenience alias: a `Result` using `CoreError` as the error type.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(kind: ItemClass, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_definition(id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidDefinition {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = CoreError::not_found(ItemClass::Weapon, "laser");
        assert_eq!(e.to_string(), "weapon 'laser' not found");

        let e = CoreError::InsufficientFunds {
            cost: 10,
            balance: 3,
        };
        assert_eq!(e.to_string(), "insufficient funds: need 10, have 3");
    }
}
