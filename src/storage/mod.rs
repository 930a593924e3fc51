//! Storage module for compiled stories
//!
//! A compiled [`Story`] is plain data and is stored as JSON. Loading checks
//! that the table is closed before handing it out.

pub mod repository;

use crate::types::story::Story;

/// Save a compiled story to bytes using JSON serialization
pub fn save(story: &Story) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_string_pretty(story)?;
    Ok(json.into_bytes())
}

/// Load a compiled story from bytes and validate its references
pub fn load(bytes: &[u8]) -> anyhow::Result<Story> {
    let json = String::from_utf8(bytes.to_vec())?;
    let story: Story = serde_json::from_str(&json)?;
    story.validate()?;
    Ok(story)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StoryFactory;

    fn sample() -> Story {
        let f = StoryFactory::new();
        let choice = f.action("Wave").append_text(["You wave."]).unwrap();
        let root = f
            .named("start")
            .append_text(["Hello"])
            .unwrap()
            .set_effect("met", true)
            .unwrap()
            .attach_action(&choice)
            .unwrap();
        choice.join().unwrap().append_text(["Bye"]).unwrap();
        f.build(&root).unwrap()
    }

    #[test]
    fn save_then_load_restores_story() {
        let story = sample();
        let bytes = save(&story).unwrap();
        let restored = load(&bytes).unwrap();

        assert_eq!(story, restored);
        assert_eq!(story.digest().unwrap(), restored.digest().unwrap());
    }

    #[test]
    fn saved_json_uses_wire_names() {
        let bytes = save(&sample()).unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert!(json.contains("\"root_id\""));
        assert!(json.contains("\"type\": \"button\""));
        assert!(json.contains("\"op\": \"set\""));
    }

    #[test]
    fn load_invalid_data_returns_error() {
        assert!(load(b"invalid json data").is_err());
    }

    #[test]
    fn load_rejects_dangling_reference() {
        let json = r#"{
            "root_id": "a",
            "nodes": {
                "a": { "id": "a", "texts": [], "next_id": "missing" }
            }
        }"#;
        let err = load(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn load_rejects_unknown_operator() {
        let json = r#"{
            "root_id": "a",
            "nodes": {
                "a": {
                    "id": "a",
                    "texts": [],
                    "rules": [{ "key": "k", "op": "contains", "value": 1, "target_id": "a" }]
                }
            }
        }"#;
        assert!(load(json.as_bytes()).is_err());
    }
}
