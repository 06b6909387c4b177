//! Profile sections that can be harvested.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of a profile to discover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Pins created by the profile owner.
    #[default]
    Created,
    /// Pins the profile has saved.
    Saved,
    /// The profile's boards (collections).
    Boards,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Saved => "saved",
            Self::Boards => "boards",
        }
    }

    /// Path suffix appended to `/<profile>/` for this section.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Self::Created => "_created/",
            Self::Saved => "",
            Self::Boards => "boards/",
        }
    }

    /// Relative source path for a profile, e.g. `/alice/_created/`.
    pub fn source_path(&self, profile: &str) -> String {
        format!("/{}/{}", profile, self.path_suffix())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
