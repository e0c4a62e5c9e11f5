//! Deterministic template content.
//!
//! Built from the theme vocabulary, the coordinate and the depth alone, so the
//! same room always reads the same way and no RNG state is consumed.

use dungeon_model::{ContentPayload, Direction, Npc, Theme};
use tracing::warn;

use super::{ContentGenerationError, ContentSource, RoomContext};

/// Fallback content source. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContent;

impl TemplateContent {
    /// Renders a payload for a room.
    pub fn render(&self, theme: Theme, context: &RoomContext) -> ContentPayload {
        let profile = theme.profile();
        let seed = mix(context);

        if context.depth == 0 && context.arrived_by.is_none() {
            let description = format!(
                "You stand at the entrance of a {} dungeon. The air is thick with mystery and adventure awaits.",
                theme
            );
            let title = "Dungeon Entrance";
            return build(
                title,
                description,
                vec![pick(profile.items, seed).to_string()],
                Vec::new(),
            )
            .with_ascii_art(banner(title, theme));
        }

        let adjective = pick(profile.adjectives, seed);
        let kind = pick(profile.room_kinds, seed >> 8);
        let title = format!("{} {}", capitalize(adjective), capitalize(kind));

        let mut description = format!("You enter a {} {}.", adjective, kind);
        if let Some(direction) = context.arrived_by {
            description.push(' ');
            description.push_str(arrival_hint(direction));
        }
        if let Some(from) = &context.from_title {
            description.push_str(&format!(" Behind you lies the {}.", from.to_lowercase()));
        }

        // 1..=4 items, more the deeper you go
        let wanted = (context.depth as usize / 3 + (seed % 3) as usize).clamp(1, 4);
        let items = distinct(profile.items, seed >> 16, wanted);

        let npcs = if (seed >> 24) % 10 < 3 {
            let (name, role) = profile.npcs[((seed >> 32) as usize) % profile.npcs.len()];
            vec![Npc::new(name, role)]
        } else {
            Vec::new()
        };

        build(&title, description, items, npcs).with_ascii_art(banner(&title, theme))
    }
}

impl ContentSource for TemplateContent {
    fn generate_content(
        &self,
        theme: Theme,
        context: &RoomContext,
    ) -> Result<ContentPayload, ContentGenerationError> {
        Ok(self.render(theme, context))
    }

    fn name(&self) -> &str {
        "template"
    }
}

fn build(title: &str, description: String, items: Vec<String>, npcs: Vec<Npc>) -> ContentPayload {
    ContentPayload::validated(title, description, items, npcs).unwrap_or_else(|err| {
        warn!(title, error = %err, "template content rejected, using a bare room");
        ContentPayload::placeholder()
    })
}

/// Framed title in the theme's border style.
fn banner(title: &str, theme: Theme) -> String {
    let (corner, edge, side) = match theme {
        Theme::Fantasy => ('*', '~', '|'),
        Theme::SciFi => ('+', '=', '|'),
        Theme::Horror => ('x', '.', ':'),
        Theme::Cyberpunk => ('#', '-', '!'),
    };
    let width = title.chars().count() + 4;
    let rule: String = std::iter::once(corner)
        .chain(std::iter::repeat(edge).take(width - 2))
        .chain(std::iter::once(corner))
        .collect();
    format!("{rule}\n{side} {title} {side}\n{rule}")
}

fn arrival_hint(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "Worn steps climb up into this level.",
        Direction::Down => "A narrow stair spirals down to this place.",
        Direction::North | Direction::South => "The passage runs straight here.",
        Direction::East | Direction::West => "A side passage opens here.",
    }
}

/// Spreads coordinate and depth bits over a u64 (splitmix64 finalizer).
fn mix(context: &RoomContext) -> u64 {
    let c = context.coordinate;
    let mut z = (c.x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (c.y as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (c.z as i64 as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
        ^ u64::from(context.depth);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn pick(options: &'static [&'static str], seed: u64) -> &'static str {
    options[(seed as usize) % options.len()]
}

fn distinct(options: &'static [&'static str], seed: u64, count: usize) -> Vec<String> {
    let count = count.min(options.len());
    let start = (seed as usize) % options.len();
    (0..count)
        .map(|i| options[(start + i) % options.len()].to_string())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_model::Coordinate;

    fn context(x: i32, y: i32, depth: u32) -> RoomContext {
        RoomContext {
            coordinate: Coordinate::new(x, y, 0),
            depth,
            arrived_by: Some(Direction::North),
            from_title: Some("Dungeon Entrance".into()),
        }
    }

    #[test]
    fn test_origin_is_entrance() {
        let payload = TemplateContent.render(Theme::Fantasy, &RoomContext::origin());
        assert_eq!(payload.title(), "Dungeon Entrance");
        assert!(payload.description().contains("fantasy dungeon"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = TemplateContent.render(Theme::SciFi, &context(3, -2, 5));
        let b = TemplateContent.render(Theme::SciFi, &context(3, -2, 5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_items_are_distinct_and_bounded() {
        for x in -5..5 {
            for depth in [1, 4, 12, 40] {
                let payload = TemplateContent.render(Theme::Horror, &context(x, 1, depth));
                let items = payload.items();
                assert!(!items.is_empty() && items.len() <= 4);
                let unique: std::collections::HashSet<_> = items.iter().collect();
                assert_eq!(unique.len(), items.len());
            }
        }
    }

    #[test]
    fn test_description_mentions_previous_room() {
        let payload = TemplateContent.render(Theme::Cyberpunk, &context(0, 1, 1));
        assert!(payload.description().contains("dungeon entrance"));
    }

    #[test]
    fn test_every_room_gets_a_banner() {
        let payload = TemplateContent.render(Theme::SciFi, &context(2, 2, 3));
        let art = payload.ascii_art().unwrap();
        let lines: Vec<&str> = art.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("| {} |", payload.title()));
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
        assert!(lines[0].starts_with('+') && lines[0].contains('='));
    }

    #[test]
    fn test_entrance_banner() {
        let payload = TemplateContent.render(Theme::Horror, &RoomContext::origin());
        assert_eq!(
            payload.ascii_art(),
            Some("x..................x\n: Dungeon Entrance :\nx..................x")
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("neon"), "Neon");
        assert_eq!(capitalize(""), "");
    }
}
