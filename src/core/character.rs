//! Character catalog entries and the client-side picker filter.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::UserChat;

/// Status text shown for characters opened from the chat list, where the
/// summary carries no status of its own.
pub const ONLINE_STATUS: &str = "Online";

/// Fixed catalog of filter tags the picker offers.
pub const FILTER_TAGS: &[&str] = &[
    "Realistic",
    "Anime",
    "Fantasy",
    "Sci-Fi",
    "Modern",
    "Friendly",
    "Mysterious",
    "Romantic",
    "Playful",
    "Serious",
    "Funny",
    "Intellectual",
    "Adventurous",
    "Caring",
    "Young Adult",
    "Mature",
    "MILF",
    "Girlfriend",
    "Boyfriend",
    "Teacher",
    "Student",
    "Asian",
    "European",
    "Slim",
    "Curvy",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_age",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<u32>,
}

/// Ages arrive as numbers or numeric strings; anything else is treated as unknown.
fn lenient_age<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl Character {
    pub fn personality_tags(&self) -> &[String] {
        self.personality_tags.as_deref().unwrap_or_default()
    }

    pub fn filter_tags(&self) -> &[String] {
        self.filter_tags.as_deref().unwrap_or_default()
    }
}

impl From<&UserChat> for Character {
    fn from(chat: &UserChat) -> Self {
        Self {
            id: chat.character_id.clone(),
            name: chat.character_name.clone(),
            profile_picture: chat.character_avatar.clone(),
            status_text: ONLINE_STATUS.to_string(),
            personality_tags: None,
            filter_tags: None,
            age: None,
        }
    }
}

pub fn is_known_tag(tag: &str) -> bool {
    FILTER_TAGS.contains(&tag)
}

/// Search term plus active tag set. Pure and synchronous: the same inputs
/// always produce the same list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    pub search: String,
    pub active_tags: Vec<String>,
}

impl CharacterFilter {
    pub fn new(search: impl Into<String>, active_tags: Vec<String>) -> Self {
        Self {
            search: search.into(),
            active_tags,
        }
    }

    /// Add the tag if absent, remove it if present. Activation order is kept.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.active_tags.iter().position(|t| t == tag) {
            self.active_tags.remove(pos);
        } else {
            self.active_tags.push(tag.to_string());
        }
    }

    pub fn is_active(&self, tag: &str) -> bool {
        self.active_tags.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.active_tags.is_empty()
    }

    pub fn matches_search(&self, character: &Character) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        character.name.to_lowercase().contains(&needle)
            || character.status_text.to_lowercase().contains(&needle)
            || character
                .personality_tags()
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Tag matching is exact and case-sensitive; tags come from the fixed catalog.
    pub fn matches_tags(&self, character: &Character) -> bool {
        if self.active_tags.is_empty() {
            return true;
        }
        let tags = character.filter_tags();
        self.active_tags
            .iter()
            .all(|wanted| tags.iter().any(|tag| tag == wanted))
    }

    pub fn matches(&self, character: &Character) -> bool {
        self.matches_search(character) && self.matches_tags(character)
    }

    pub fn apply(&self, characters: &[Character]) -> Vec<Character> {
        characters
            .iter()
            .filter(|character| self.matches(character))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn test_character(id: &str, name: &str) -> Character {
    Character {
        id: id.to_string(),
        name: name.to_string(),
        profile_picture: None,
        status_text: String::new(),
        personality_tags: None,
        filter_tags: None,
        age: None,
    }
}
