//! Platform name to catalog console mapping

use crate::catalog::{ConsoleCatalog, ConsoleCatalogEntry};

/// Host platform names that differ from catalog console names
const PLATFORM_SYNONYMS: &[(&str, &str)] = &[
    ("super nintendo", "snes"),
    ("super nintendo entertainment system", "snes"),
    ("nintendo", "nes"),
    ("nintendo entertainment system", "nes"),
    ("sega genesis", "mega drive"),
];

const PLAYSTATION_PREFIX: &str = "sony playstation";

/// Lowercased, trimmed, with known synonyms applied
pub fn normalize_platform_name(platform: &str) -> String {
    let lower = platform.trim().to_lowercase();

    if let Some((_, canonical)) = PLATFORM_SYNONYMS.iter().find(|(alias, _)| *alias == lower) {
        return (*canonical).to_string();
    }
    if lower.contains(PLAYSTATION_PREFIX) {
        return lower.replace(PLAYSTATION_PREFIX, "playstation");
    }
    lower
}

/// Find the console for one platform name
///
/// Exact (case-insensitive) name match first, then a match on any
/// `/`-separated segment of the console name ("Genesis/Mega Drive").
/// Catalog order decides between several candidates.
pub fn find_console<'a>(catalog: &'a ConsoleCatalog, platform: &str) -> Option<&'a ConsoleCatalogEntry> {
    let wanted = normalize_platform_name(platform);
    if wanted.is_empty() {
        return None;
    }

    catalog
        .entries()
        .iter()
        .find(|c| c.name.trim().to_lowercase() == wanted)
        .or_else(|| {
            catalog.entries().iter().find(|c| {
                let name = c.name.to_lowercase();
                name.contains('/') && name.split('/').any(|segment| segment.trim() == wanted)
            })
        })
}

/// First of the game's platforms that maps to a console
pub fn find_console_for_platforms<'a>(
    catalog: &'a ConsoleCatalog,
    platforms: &[String],
) -> Option<&'a ConsoleCatalogEntry> {
    platforms.iter().find_map(|p| find_console(catalog, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ConsoleCatalog {
        ConsoleCatalog::new(vec![
            ConsoleCatalogEntry { id: 1, name: "Genesis/Mega Drive".to_string() },
            ConsoleCatalogEntry { id: 3, name: "SNES/Super Famicom".to_string() },
            ConsoleCatalogEntry { id: 7, name: "NES/Famicom".to_string() },
            ConsoleCatalogEntry { id: 12, name: "PlayStation".to_string() },
            ConsoleCatalogEntry { id: 21, name: "PlayStation 2".to_string() },
            ConsoleCatalogEntry { id: 4, name: "Game Boy".to_string() },
        ])
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(normalize_platform_name("Super Nintendo"), "snes");
        assert_eq!(normalize_platform_name(" Nintendo "), "nes");
        assert_eq!(normalize_platform_name("Sega Genesis"), "mega drive");
        assert_eq!(normalize_platform_name("Sony PlayStation 2"), "playstation 2");
        assert_eq!(normalize_platform_name("Nintendo Game Boy"), "nintendo game boy");
    }

    #[test]
    fn test_exact_match() {
        let catalog = catalog();
        assert_eq!(find_console(&catalog, "game boy").map(|c| c.id), Some(4));
        assert_eq!(find_console(&catalog, "Sony PlayStation").map(|c| c.id), Some(12));
        assert_eq!(find_console(&catalog, "Sony PlayStation 2").map(|c| c.id), Some(21));
    }

    #[test]
    fn test_segment_match() {
        let catalog = catalog();
        assert_eq!(find_console(&catalog, "Super Nintendo").map(|c| c.id), Some(3));
        assert_eq!(find_console(&catalog, "Sega Genesis").map(|c| c.id), Some(1));
        assert_eq!(find_console(&catalog, "Nintendo").map(|c| c.id), Some(7));
    }

    #[test]
    fn test_no_match() {
        let catalog = catalog();
        assert!(find_console(&catalog, "Atari Jaguar").is_none());
        assert!(find_console(&catalog, "").is_none());
        assert!(find_console(&ConsoleCatalog::default(), "SNES").is_none());
    }

    #[test]
    fn test_platforms_tried_in_order() {
        let catalog = catalog();
        let platforms = vec!["PC (Windows)".to_string(), "Super Nintendo".to_string()];
        assert_eq!(find_console_for_platforms(&catalog, &platforms).map(|c| c.id), Some(3));
    }
}
