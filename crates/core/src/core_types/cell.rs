//! Cell states of the landscape grid
//!
//! Every grid position holds exactly one [`CellState`]. Only the two tree
//! variants are flammable; `Burning` is transient and `Burnt`, `Water` and
//! `Rock` are inert for the remainder of a run.

use serde::{Deserialize, Serialize};

/// Burn duration (in steps) given to a tree ignited by a burning neighbour.
///
/// Both tree subtypes use the same value in the spread rule, unlike the
/// initial ignition durations returned by [`CellState::ignition_duration`].
pub const SPREAD_BURN_DURATION: u8 = 8;

/// State of a single landscape cell
///
/// The numeric codes are stable and used for compact export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    /// Bare ground (unused by the generator, kept as the zero value)
    #[default]
    Ground = 0,
    /// Long burning tree (10 steps when ignited directly)
    TreePrimary = 1,
    /// Currently on fire
    Burning = 2,
    /// Water body, never burns
    Water = 3,
    /// Rock outcrop, never burns
    Rock = 4,
    /// Burnt out
    Burnt = 5,
    /// Short burning tree (3 steps when ignited directly)
    TreeSecondary = 6,
}

impl CellState {
    /// All states in code order.
    pub const ALL: [CellState; 7] = [
        CellState::Ground,
        CellState::TreePrimary,
        CellState::Burning,
        CellState::Water,
        CellState::Rock,
        CellState::Burnt,
        CellState::TreeSecondary,
    ];

    /// Stable numeric code of this state.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// True for the tree states a fire can spread into.
    #[inline]
    pub const fn is_flammable(self) -> bool {
        matches!(self, CellState::TreePrimary | CellState::TreeSecondary)
    }

    #[inline]
    pub const fn is_burning(self) -> bool {
        matches!(self, CellState::Burning)
    }

    /// Burn duration when this cell is the initial ignition point.
    ///
    /// `None` for non-flammable states.
    pub const fn ignition_duration(self) -> Option<u8> {
        match self {
            CellState::TreePrimary => Some(10),
            CellState::TreeSecondary => Some(3),
            _ => None,
        }
    }
}
