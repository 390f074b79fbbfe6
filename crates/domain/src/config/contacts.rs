use serde::{Deserialize, Serialize};

use crate::contact::Category;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Contact tables
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One configured contact. `id` is a phone number, with or without a
/// transport suffix (`2348012345678`, `2348012345678@c.us`, `+234 801…`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub name: String,
    pub id: String,
}

/// Contact tables keyed by relationship category. Only people listed here
/// get automatic replies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactsConfig {
    #[serde(default)]
    pub family_elder: Vec<ContactEntry>,
    #[serde(default)]
    pub male_friends: Vec<ContactEntry>,
    #[serde(default)]
    pub female_friends: Vec<ContactEntry>,
    /// Known contacts that get the generic tone.
    #[serde(default)]
    pub other: Vec<ContactEntry>,
}

impl ContactsConfig {
    pub fn table(&self, category: Category) -> &[ContactEntry] {
        match category {
            Category::FamilyElder => &self.family_elder,
            Category::MaleFriend => &self.male_friends,
            Category::FemaleFriend => &self.female_friends,
            Category::Other => &self.other,
        }
    }

    /// Tables in lookup priority order.
    pub fn tables(&self) -> impl Iterator<Item = (Category, &[ContactEntry])> {
        Category::PRIORITY.into_iter().map(move |c| (c, self.table(c)))
    }

    pub fn is_empty(&self) -> bool {
        self.tables().all(|(_, t)| t.is_empty())
    }

    pub fn len(&self) -> usize {
        self.tables().map(|(_, t)| t.len()).sum()
    }
}
