// src/models/person.rs

//! People directory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A person known to the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Portal person id (student or teacher id)
    pub id: String,
    pub name: String,
    pub kind: PersonKind,
    /// Class label for students ("2a"), initials for teachers ("ABC")
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonKind {
    Student,
    Teacher,
}

/// Reference to one class whose roster the crawler visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: String,
    pub label: String,
}

/// The roster page of a single class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRoster {
    pub class: ClassRef,
    pub members: Vec<Person>,
}

/// The accumulated people directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonDirectory {
    /// Keyed by person id, deduplicated across rosters
    pub people: BTreeMap<String, Person>,
    /// Set when the directory is the result of a completed crawl
    pub completed_at: Option<DateTime<Utc>>,
}

impl PersonDirectory {
    /// Merge all members of a roster, newer entries winning.
    pub fn merge(&mut self, members: impl IntoIterator<Item = Person>) {
        for person in members {
            self.people.insert(person.id.clone(), person);
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Case-insensitive name search, for recipient pickers.
    pub fn search(&self, query: &str) -> Vec<&Person> {
        let needle = query.to_lowercase();
        self.people
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: id.into(),
            name: name.into(),
            kind: PersonKind::Student,
            label: None,
        }
    }

    #[test]
    fn merge_deduplicates_by_id() {
        let mut dir = PersonDirectory::default();
        dir.merge(vec![person("1", "Anna"), person("2", "Bo")]);
        dir.merge(vec![person("2", "Bo Hansen")]);

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.people["2"].name, "Bo Hansen");
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut dir = PersonDirectory::default();
        dir.merge(vec![person("1", "Anna Møller"), person("2", "Bo")]);

        assert_eq!(dir.search("anna").len(), 1);
        assert!(dir.search("xyz").is_empty());
    }
}
