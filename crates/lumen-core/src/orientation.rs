#![forbid(unsafe_code)]

//! Window orientation sets.
//!
//! [`Orientation`] is a set over the four physical orientations a window
//! can assume. A window uses it both for the orientations it allows and,
//! with a single member, for the orientation it currently has.
//!
//! # Invariants
//!
//! 1. Display order is fixed: Portrait, LandscapeLeft, LandscapeRight,
//!    PortraitUpsideDown. It does not depend on how the set was built.
//! 2. Members are joined with `" | "`; absent members contribute nothing,
//!    so the empty set renders as `""`.

use std::fmt;

bitflags::bitflags! {
    /// Set of physical window orientations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Orientation: u8 {
        const PORTRAIT = 1 << 0;
        const LANDSCAPE_LEFT = 1 << 1;
        const LANDSCAPE_RIGHT = 1 << 2;
        const PORTRAIT_UPSIDE_DOWN = 1 << 3;

        const LANDSCAPE = Self::LANDSCAPE_LEFT.bits() | Self::LANDSCAPE_RIGHT.bits();
        const ALL = Self::PORTRAIT.bits()
            | Self::LANDSCAPE_LEFT.bits()
            | Self::LANDSCAPE_RIGHT.bits()
            | Self::PORTRAIT_UPSIDE_DOWN.bits();
    }
}

/// Single orientations paired with their display names, in display order.
const MEMBERS: [(Orientation, &str); 4] = [
    (Orientation::PORTRAIT, "Portrait"),
    (Orientation::LANDSCAPE_LEFT, "LandscapeLeft"),
    (Orientation::LANDSCAPE_RIGHT, "LandscapeRight"),
    (Orientation::PORTRAIT_UPSIDE_DOWN, "PortraitUpsideDown"),
];

impl Orientation {
    /// Single orientations present in this set, in display order.
    pub fn members(self) -> impl Iterator<Item = Orientation> {
        MEMBERS
            .iter()
            .map(|(flag, _)| *flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Names of the members present in this set, in display order.
    pub fn member_names(self) -> impl Iterator<Item = &'static str> {
        MEMBERS
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }

    /// Whether the set holds exactly one orientation.
    #[must_use]
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.member_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Human-readable rendering of an orientation set.
#[must_use]
pub fn orientation_to_string(orientation: Orientation) -> String {
    orientation.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pairs_in_fixed_order() {
        assert_eq!(
            orientation_to_string(Orientation::PORTRAIT | Orientation::LANDSCAPE_LEFT),
            "Portrait | LandscapeLeft"
        );
        assert_eq!(
            orientation_to_string(Orientation::PORTRAIT_UPSIDE_DOWN | Orientation::PORTRAIT),
            "Portrait | PortraitUpsideDown"
        );
    }

    #[test]
    fn formats_all() {
        assert_eq!(
            orientation_to_string(Orientation::ALL),
            "Portrait | LandscapeLeft | LandscapeRight | PortraitUpsideDown"
        );
    }

    #[test]
    fn empty_set_is_empty_string() {
        assert_eq!(orientation_to_string(Orientation::empty()), "");
    }

    #[test]
    fn single_member_has_no_separator() {
        assert_eq!(Orientation::LANDSCAPE_RIGHT.to_string(), "LandscapeRight");
        assert!(Orientation::LANDSCAPE_RIGHT.is_single());
        assert!(!Orientation::LANDSCAPE.is_single());
    }

    #[test]
    fn all_is_union_of_members() {
        let union = MEMBERS
            .iter()
            .fold(Orientation::empty(), |acc, (flag, _)| acc | *flag);
        assert_eq!(union, Orientation::ALL);
        assert!(Orientation::ALL.contains(Orientation::LANDSCAPE));
    }

    #[test]
    fn members_yield_singles_in_display_order() {
        let members: Vec<_> = (Orientation::PORTRAIT_UPSIDE_DOWN | Orientation::LANDSCAPE)
            .members()
            .collect();
        assert_eq!(
            members,
            vec![
                Orientation::LANDSCAPE_LEFT,
                Orientation::LANDSCAPE_RIGHT,
                Orientation::PORTRAIT_UPSIDE_DOWN
            ]
        );
        assert_eq!(Orientation::empty().members().count(), 0);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn member_count_matches_separators(bits in 0u8..16) {
                let set = Orientation::from_bits_truncate(bits);
                let text = set.to_string();
                let members = set.bits().count_ones() as usize;
                prop_assert_eq!(text.matches(" | ").count(), members.saturating_sub(1));
                prop_assert!(!text.starts_with(" | "));
            }
        }
    }
}
