//! Room Content
//!
//! The payload a content collaborator hands back for a new room. The engine
//! stores it verbatim and never inspects it past validation.

use serde::{Deserialize, Serialize};

/// Errors raised while validating or parsing collaborator output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("content is missing a title")]
    MissingTitle,
    #[error("content is missing a description")]
    MissingDescription,
    #[error("malformed npc entry: '{0}'")]
    MalformedNpc(String),
}

/// A non-player character mentioned in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    pub role: String,
}

impl Npc {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Validated, immutable room content.
///
/// Fields are private so a payload can only come out of [`ContentPayload::validated`]
/// or [`ContentPayload::parse_response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    title: String,
    description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    items: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    npcs: Vec<Npc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ascii_art: Option<String>,
}

impl ContentPayload {
    /// Builds a payload, trimming text and rejecting empty required fields.
    pub fn validated(
        title: impl Into<String>,
        description: impl Into<String>,
        items: Vec<String>,
        npcs: Vec<Npc>,
    ) -> Result<Self, ContentError> {
        let title = title.into().trim().to_string();
        let description = description.into().trim().to_string();
        if title.is_empty() {
            return Err(ContentError::MissingTitle);
        }
        if description.is_empty() {
            return Err(ContentError::MissingDescription);
        }

        let items = items
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        let npcs = npcs
            .into_iter()
            .filter(|n| !n.name.trim().is_empty())
            .collect();

        Ok(Self {
            title,
            description,
            items,
            npcs,
            ascii_art: None,
        })
    }

    /// A plain room, used when nothing better can be built.
    pub fn placeholder() -> Self {
        Self {
            title: "Bare Room".to_string(),
            description: "Four walls and a floor. Nothing here stands out.".to_string(),
            items: Vec::new(),
            npcs: Vec::new(),
            ascii_art: None,
        }
    }

    /// Attaches ASCII art. Blank art is dropped.
    pub fn with_ascii_art(mut self, art: impl Into<String>) -> Self {
        let art = art.into();
        self.ascii_art = if art.trim().is_empty() { None } else { Some(art) };
        self
    }

    /// Parses the line-oriented format a language-model collaborator replies with:
    ///
    /// ```text
    /// TITLE: Flooded Armory
    /// DESCRIPTION: Racks of rusted blades stand in ankle-deep water.
    /// ITEMS: enchanted sword, chainmail armor
    /// NPCS: Master Blacksmith (weaponsmith)
    /// ART:
    ///   /|\
    ///  |===|
    /// ```
    ///
    /// Unknown lines are ignored. Description may continue over several lines;
    /// art runs from `ART:` to the next label and keeps its indentation.
    pub fn parse_response(text: &str) -> Result<Self, ContentError> {
        let mut title = String::new();
        let mut description = String::new();
        let mut items = Vec::new();
        let mut npcs = Vec::new();
        let mut art: Vec<&str> = Vec::new();
        let mut section = Section::Other;

        for raw in text.lines() {
            let line = raw.trim();

            if let Some(rest) = strip_label(line, "TITLE:") {
                title = rest.to_string();
                section = Section::Other;
            } else if let Some(rest) = strip_label(line, "DESCRIPTION:") {
                description = rest.to_string();
                section = Section::Description;
            } else if let Some(rest) = strip_label(line, "ITEMS:") {
                items = rest
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                section = Section::Other;
            } else if let Some(rest) = strip_label(line, "NPCS:") {
                npcs = parse_npcs(rest)?;
                section = Section::Other;
            } else if let Some(rest) = strip_label(line, "ART:") {
                art.clear();
                if !rest.is_empty() {
                    art.push(rest);
                }
                section = Section::Art;
            } else {
                match section {
                    Section::Art => art.push(raw.trim_end()),
                    Section::Description if !line.is_empty() => {
                        description.push(' ');
                        description.push_str(line);
                    }
                    Section::Description => section = Section::Other,
                    Section::Other => {}
                }
            }
        }

        while art.last().is_some_and(|l| l.is_empty()) {
            art.pop();
        }
        let payload = Self::validated(title, description, items, npcs)?;
        Ok(payload.with_ascii_art(art.join("\n")))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn ascii_art(&self) -> Option<&str> {
        self.ascii_art.as_deref()
    }
}

#[derive(Clone, Copy)]
enum Section {
    Description,
    Art,
    Other,
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    match line.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => Some(line[label.len()..].trim()),
        _ => None,
    }
}

/// Parses "Name (role), Other Name (role)". A bare name gets role "stranger".
fn parse_npcs(text: &str) -> Result<Vec<Npc>, ContentError> {
    let mut npcs = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let rest_trimmed = rest.trim_start_matches([',', ' ']);
        if rest_trimmed.is_empty() {
            break;
        }
        match (rest_trimmed.find('('), rest_trimmed.find(',')) {
            (Some(open), comma) if comma.map_or(true, |c| open < c) => {
                let close = rest_trimmed[open..]
                    .find(')')
                    .map(|c| open + c)
                    .ok_or_else(|| ContentError::MalformedNpc(rest_trimmed.to_string()))?;
                let name = rest_trimmed[..open].trim();
                let role = rest_trimmed[open + 1..close].trim();
                if name.is_empty() {
                    return Err(ContentError::MalformedNpc(rest_trimmed[..=close].to_string()));
                }
                npcs.push(Npc::new(name, role));
                rest = &rest_trimmed[close + 1..];
            }
            (_, Some(comma)) => {
                let name = rest_trimmed[..comma].trim();
                if !name.is_empty() {
                    npcs.push(Npc::new(name, "stranger"));
                }
                rest = &rest_trimmed[comma + 1..];
            }
            (_, None) => {
                npcs.push(Npc::new(rest_trimmed.trim(), "stranger"));
                break;
            }
        }
    }

    Ok(npcs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_rejects_empty_title() {
        let err = ContentPayload::validated("  ", "desc", vec![], vec![]).unwrap_err();
        assert_eq!(err, ContentError::MissingTitle);
    }

    #[test]
    fn test_validated_rejects_empty_description() {
        let err = ContentPayload::validated("Hall", "", vec![], vec![]).unwrap_err();
        assert_eq!(err, ContentError::MissingDescription);
    }

    #[test]
    fn test_validated_drops_blank_items() {
        let payload = ContentPayload::validated(
            "Hall",
            "A hall.",
            vec!["torch".into(), " ".into()],
            vec![],
        )
        .unwrap();
        assert_eq!(payload.items(), &["torch".to_string()]);
    }

    #[test]
    fn test_parse_response_full() {
        let text = "TITLE: Flooded Armory\n\
                    DESCRIPTION: Racks of rusted blades stand in water.\n\
                    The air smells of iron.\n\
                    ITEMS: enchanted sword, chainmail armor, \n\
                    NPCS: Master Blacksmith (weaponsmith), Old Tom (drunk)\n";
        let payload = ContentPayload::parse_response(text).unwrap();
        assert_eq!(payload.title(), "Flooded Armory");
        assert_eq!(
            payload.description(),
            "Racks of rusted blades stand in water. The air smells of iron."
        );
        assert_eq!(payload.items().len(), 2);
        assert_eq!(payload.npcs()[0], Npc::new("Master Blacksmith", "weaponsmith"));
        assert_eq!(payload.npcs()[1], Npc::new("Old Tom", "drunk"));
    }

    #[test]
    fn test_parse_response_bare_npc_names() {
        let text = "title: Crypt\ndescription: Cold stone.\nnpcs: Ghoul, Wraith";
        let payload = ContentPayload::parse_response(text).unwrap();
        assert_eq!(payload.npcs().len(), 2);
        assert_eq!(payload.npcs()[1].role, "stranger");
    }

    #[test]
    fn test_parse_response_missing_title() {
        let text = "DESCRIPTION: Somewhere.";
        assert_eq!(
            ContentPayload::parse_response(text).unwrap_err(),
            ContentError::MissingTitle
        );
    }

    #[test]
    fn test_parse_response_unclosed_role() {
        let text = "TITLE: A\nDESCRIPTION: B\nNPCS: Bob (guard";
        assert!(matches!(
            ContentPayload::parse_response(text),
            Err(ContentError::MalformedNpc(_))
        ));
    }

    #[test]
    fn test_parse_response_art_keeps_indentation() {
        let text = "TITLE: Gate\n\
                    DESCRIPTION: A tall gate.\n\
                    ART:\n   /\\\n  /  \\\n  |[]|\n\n\
                    ITEMS: key\n";
        let payload = ContentPayload::parse_response(text).unwrap();
        assert_eq!(payload.ascii_art(), Some("   /\\\n  /  \\\n  |[]|"));
        assert_eq!(payload.items(), &["key".to_string()]);
    }

    #[test]
    fn test_parse_response_without_art() {
        let text = "TITLE: Gate\nDESCRIPTION: A tall gate.\nART:\n";
        let payload = ContentPayload::parse_response(text).unwrap();
        assert_eq!(payload.ascii_art(), None);
    }

    #[test]
    fn test_placeholder_is_valid() {
        let payload = ContentPayload::placeholder();
        assert!(!payload.title().is_empty());
        assert!(!payload.description().is_empty());
    }

    #[test]
    fn test_payload_json_skips_empty_fields() {
        let payload = ContentPayload::validated("Hall", "A hall.", vec![], vec![]).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"title":"Hall","description":"A hall."}"#);
    }
}
