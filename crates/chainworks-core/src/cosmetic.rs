//! Cosmetic press settings. They are persisted but never touch quality.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PillDesign {
    #[default]
    Tesla,
    Skull,
    Heart,
    Star,
    Crown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PillColor {
    #[default]
    Pink,
    Blue,
    Green,
    Yellow,
    Orange,
    White,
}

impl PillDesign {
    pub const ALL: [PillDesign; 5] = [
        PillDesign::Tesla,
        PillDesign::Skull,
        PillDesign::Heart,
        PillDesign::Star,
        PillDesign::Crown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PillDesign::Tesla => "TESLA",
            PillDesign::Skull => "SKULL",
            PillDesign::Heart => "HEART",
            PillDesign::Star => "STAR",
            PillDesign::Crown => "CROWN",
        }
    }

    /// Parse a persisted name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// The next design, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}

impl PillColor {
    pub const ALL: [PillColor; 6] = [
        PillColor::Pink,
        PillColor::Blue,
        PillColor::Green,
        PillColor::Yellow,
        PillColor::Orange,
        PillColor::White,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PillColor::Pink => "PINK",
            PillColor::Blue => "BLUE",
            PillColor::Green => "GREEN",
            PillColor::Yellow => "YELLOW",
            PillColor::Orange => "ORANGE",
            PillColor::White => "WHITE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// The next colour, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}
