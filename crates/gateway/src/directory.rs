//! Contact directory: maps a sender id to its relationship category.
//!
//! Built once from `[contacts]` and shared read-only behind an `Arc`.

use wb_domain::config::{canonical_id, ContactsConfig};
use wb_domain::contact::Category;

struct KnownContact {
    canonical: String,
    name: String,
}

pub struct ContactDirectory {
    /// Tables in lookup priority order.
    tables: Vec<(Category, Vec<KnownContact>)>,
}

impl ContactDirectory {
    pub fn from_config(cfg: &ContactsConfig) -> Self {
        let tables = cfg
            .tables()
            .map(|(category, entries)| {
                let known = entries
                    .iter()
                    .map(|e| KnownContact {
                        canonical: canonical_id(&e.id),
                        name: e.name.clone(),
                    })
                    .filter(|k| !k.canonical.is_empty())
                    .collect();
                (category, known)
            })
            .collect();
        Self { tables }
    }

    /// Canonical form of a participant id: transport suffix stripped, digits
    /// only.
    pub fn canonicalize(id: &str) -> String {
        canonical_id(id)
    }

    /// Category of `id`, or `None` for strangers.
    pub fn lookup(&self, id: &str) -> Option<Category> {
        self.lookup_contact(id).map(|(category, _)| category)
    }

    /// Category and configured display name of `id`.
    ///
    /// When a number appears in several tables the first table in priority
    /// order wins.
    pub fn lookup_contact(&self, id: &str) -> Option<(Category, &str)> {
        let canonical = Self::canonicalize(id);
        if canonical.is_empty() {
            return None;
        }
        self.tables.iter().find_map(|(category, known)| {
            known
                .iter()
                .find(|k| k.canonical == canonical)
                .map(|k| (*category, k.name.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(|(_, t)| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
