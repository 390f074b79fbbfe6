use std::fmt;

use serde::{Deserialize, Serialize};

/// Relationship category of a conversation participant.
///
/// Drives the tone of generated replies. A participant that appears in no
/// contact table has no category at all (`Option::None` at lookup sites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FamilyElder,
    MaleFriend,
    FemaleFriend,
    Other,
}

impl Category {
    /// Lookup priority: earlier categories win when an id is listed twice.
    pub const PRIORITY: [Category; 4] = [
        Category::FamilyElder,
        Category::MaleFriend,
        Category::FemaleFriend,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FamilyElder => "family_elder",
            Category::MaleFriend => "male_friend",
            Category::FemaleFriend => "female_friend",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
