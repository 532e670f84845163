//! Entity lump text.
//!
//! The lump is a sequence of `{ ... }` blocks, each holding one
//! `"key" "value"` pair per line.

/// Sky box name, looked up by a plain scan for the quoted key `"sky"`.
///
/// Returns the quoted string that follows the key, or `None` if the key is
/// missing or its value is unterminated.
#[must_use]
pub fn sky_name(entities: &str) -> Option<&str> {
    let after_key = &entities[entities.find("\"sky\"")? + 5..];
    let start = after_key.find('"')? + 1;
    let len = after_key[start..].find('"')?;
    Some(&after_key[start..start + len])
}

/// One entity's key/value pairs, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pairs: Vec<(String, String)>,
}

impl Entity {
    /// Value of the first pair with this key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn classname(&self) -> Option<&str> {
        self.get("classname")
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split the entity text into entities.
///
/// Parsing is lenient: lines that are not a key followed by a value are
/// skipped, and an unterminated final block is parsed up to the end of the
/// text.
#[must_use]
pub fn parse_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut remaining = text;
    while let Some(open) = remaining.find('{') {
        remaining = &remaining[open + 1..];
        let close = remaining.find('}').unwrap_or(remaining.len());
        entities.push(parse_block(&remaining[..close]));
        remaining = remaining.get(close + 1..).unwrap_or_default();
    }
    entities
}

fn parse_block(block: &str) -> Entity {
    let pairs = block
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(char::is_whitespace)?;
            let key = key.trim_matches('"');
            let value = value.trim().trim_matches('"');
            (!key.is_empty()).then(|| (key.to_owned(), value.to_owned()))
        })
        .collect();
    Entity { pairs }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "{\n\"classname\" \"worldspawn\"\n\"sky\" \"unit1_\"\n\"message\" \"Outer Base\"\n}\n\
                        {\r\n\"classname\" \"info_player_start\"\r\n\"origin\" \"0 0 24\"\r\n}\n";

    #[test]
    fn test_sky_name() {
        assert_eq!(sky_name(TEXT), Some("unit1_"));
        assert_eq!(sky_name("\"sky\"   \"space1\""), Some("space1"));
        assert_eq!(sky_name("\"classname\" \"worldspawn\""), None);
        assert_eq!(sky_name("\"sky\" \"open"), None);
    }

    #[test]
    fn test_parse_entities() {
        let entities = parse_entities(TEXT);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].classname(), Some("worldspawn"));
        assert_eq!(entities[0].get("message"), Some("Outer Base"));
        assert_eq!(entities[1].classname(), Some("info_player_start"));
        assert_eq!(entities[1].get("origin"), Some("0 0 24"));
        assert_eq!(entities[1].get("sky"), None);
    }

    #[test]
    fn test_parse_lenient() {
        let entities = parse_entities("{\n\"a\" \"1\"\ngarbage\n\n\"b\" \"2\"");
        assert_eq!(entities.len(), 1);
        let pairs: Vec<_> = entities[0].pairs().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
        assert!(parse_entities("").is_empty());
    }
}
