//! Folder actions and action sets.
//!
//! An [`Action`] is one of six independent permission bits. An
//! [`ActionSet`] is a fixed-size bit-set over them; the named unions
//! [`ActionSet::READ`], [`ActionSet::WRITE`], [`ActionSet::ALL`] and
//! [`ActionSet::NONE`] are derived constants, never stored values.
//!
//! Both types also have a compact letter code, one letter per action:
//!
//! | Action | Letter | Meaning |
//! |--------|--------|---------|
//! | VIEW   | `v` | view members |
//! | LIST   | `l` | list subfolders; denial blocks everything below |
//! | INSERT | `i` | insert members and subfolders |
//! | DELETE | `d` | delete members and subfolders |
//! | CHANGE | `c` | change existing members |
//! | ADMIN  | `a` | change the access control list |

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use canopy_core::error::AppError;

/// A single folder action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// View members of the folder.
    View,
    /// List subfolders.
    List,
    /// Insert members or subfolders.
    Insert,
    /// Delete members or subfolders.
    Delete,
    /// Change existing members.
    Change,
    /// Change the folder's access control list.
    Admin,
}

impl Action {
    /// All actions in canonical order.
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::List,
        Action::Insert,
        Action::Delete,
        Action::Change,
        Action::Admin,
    ];

    /// Return the action as a lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::List => "list",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Change => "change",
            Self::Admin => "admin",
        }
    }

    /// The compact one-letter code.
    pub fn letter(&self) -> char {
        match self {
            Self::View => 'v',
            Self::List => 'l',
            Self::Insert => 'i',
            Self::Delete => 'd',
            Self::Change => 'c',
            Self::Admin => 'a',
        }
    }

    /// Parse a compact one-letter code.
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.letter() == letter)
    }

    /// The single-bit set containing only this action.
    pub fn bit(self) -> ActionSet {
        match self {
            Self::View => ActionSet::VIEW,
            Self::List => ActionSet::LIST,
            Self::Insert => ActionSet::INSERT,
            Self::Delete => ActionSet::DELETE,
            Self::Change => ActionSet::CHANGE,
            Self::Admin => ActionSet::ADMIN,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if let Some(action) = Self::ALL.into_iter().find(|a| a.as_str() == lower) {
            return Ok(action);
        }
        let mut chars = lower.chars();
        match (chars.next().and_then(Self::from_letter), chars.next()) {
            (Some(action), None) => Ok(action),
            _ => Err(AppError::invalid_argument(format!("Invalid action: '{s}'"))),
        }
    }
}

bitflags! {
    /// A set of folder actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ActionSet: u8 {
        /// View members.
        const VIEW   = 0b0000_0001;
        /// List subfolders.
        const LIST   = 0b0000_0010;
        /// Insert members or subfolders.
        const INSERT = 0b0000_0100;
        /// Delete members or subfolders.
        const DELETE = 0b0000_1000;
        /// Change existing members.
        const CHANGE = 0b0001_0000;
        /// Change the access control list.
        const ADMIN  = 0b0010_0000;
    }
}

impl ActionSet {
    /// No actions.
    pub const NONE: Self = Self::empty();
    /// VIEW | LIST.
    pub const READ: Self = Self::VIEW.union(Self::LIST);
    /// READ | INSERT | DELETE | CHANGE.
    pub const WRITE: Self = Self::READ
        .union(Self::INSERT)
        .union(Self::DELETE)
        .union(Self::CHANGE);
    /// WRITE | ADMIN.
    pub const ALL: Self = Self::WRITE.union(Self::ADMIN);

    /// Whether the set grants `action`.
    pub fn allows(self, action: Action) -> bool {
        self.contains(action.bit())
    }

    /// The actions in this set, in canonical order.
    pub fn actions(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |a| self.allows(*a))
    }

    /// The compact letter code, e.g. `"vl"` for READ.
    pub fn to_code(self) -> String {
        self.actions().map(|a| a.letter()).collect()
    }

    /// Parse a compact letter code. The empty string is [`ActionSet::NONE`].
    pub fn from_code(code: &str) -> Result<Self, AppError> {
        code.chars().try_fold(Self::NONE, |set, letter| {
            Action::from_letter(letter)
                .map(|a| set | a.bit())
                .ok_or_else(|| {
                    AppError::invalid_argument(format!(
                        "Invalid action letter '{letter}' in '{code}'"
                    ))
                })
        })
    }

    /// Storage representation for integer columns.
    pub fn to_i16(self) -> i16 {
        i16::from(self.bits())
    }

    /// Decode the storage representation, ignoring unknown bits.
    pub fn from_i16(raw: i16) -> Self {
        Self::from_bits_truncate((raw & 0xff) as u8)
    }
}

impl From<Action> for ActionSet {
    fn from(action: Action) -> Self {
        action.bit()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_code())
    }
}

impl FromStr for ActionSet {
    type Err = AppError;

    /// Accepts a named union (`read`, `write`, `all`, `none`) or a letter code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::NONE),
            "read" => Ok(Self::READ),
            "write" => Ok(Self::WRITE),
            "all" => Ok(Self::ALL),
            code => Self::from_code(code),
        }
    }
}
