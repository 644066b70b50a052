use crate::api::WhispiBackend;
use crate::core::character::{is_known_tag, Character, CharacterFilter, FILTER_TAGS};

/// Reject tags outside the catalog, listing the valid ones.
pub fn parse_tags(tags: &[String]) -> Result<Vec<String>, String> {
    let unknown: Vec<&str> = tags
        .iter()
        .map(String::as_str)
        .filter(|tag| !is_known_tag(tag))
        .collect();
    if !unknown.is_empty() {
        return Err(format!(
            "Unknown tag(s): {}\n   Available tags: {}",
            unknown.join(", "),
            FILTER_TAGS.join(", ")
        ));
    }

    let mut filter = CharacterFilter::default();
    for tag in tags {
        if !filter.is_active(tag) {
            filter.toggle_tag(tag);
        }
    }
    Ok(filter.active_tags)
}

pub async fn list_characters(
    backend: &dyn WhispiBackend,
    limit: u32,
    search: &str,
    tags: &[String],
) -> Result<(), String> {
    let filter = CharacterFilter::new(search.trim(), parse_tags(tags)?);
    let characters = backend
        .list_characters(limit, &[])
        .await
        .map_err(|err| format!("Failed to load characters: {err}"))?;
    let matches = filter.apply(&characters);

    if matches.is_empty() {
        if filter.is_empty() {
            println!("No characters available.");
        } else {
            println!("No characters match.");
        }
        return Ok(());
    }

    println!("Characters ({} of {}):\n", matches.len(), characters.len());
    for character in &matches {
        println!("{}", describe(character));
    }
    println!("\n💡 Start a conversation with:");
    println!("   whispi say --character <ID> <message>");
    Ok(())
}

fn describe(character: &Character) -> String {
    let mut line = format!("  • {} [{}]", character.name, character.id);
    if let Some(age) = character.age {
        line.push_str(&format!(", {age}"));
    }
    if !character.status_text.is_empty() {
        line.push_str(&format!(" - {}", character.status_text));
    }
    if !character.filter_tags().is_empty() {
        line.push_str(&format!("\n      tags: {}", character.filter_tags().join(", ")));
    }
    line
}
