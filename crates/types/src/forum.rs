// Path: crates/types/src/forum.rs
//! Forum-side shapes exchanged with the forum API.

use serde::{Deserialize, Serialize};

/// A tag configured on a forum channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumTag {
    pub id: String,
    pub name: String,
}

/// The parts of a forum channel the bridge reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumChannel {
    #[serde(default)]
    pub available_tags: Vec<ForumTag>,
}

impl ForumChannel {
    /// Returns the ids of every available tag whose name is in `names`,
    /// in the channel's tag order. Unknown names are silently dropped.
    pub fn tag_ids_for(&self, names: &[&str]) -> Vec<String> {
        self.available_tags
            .iter()
            .filter(|tag| names.contains(&tag.name.as_str()))
            .map(|tag| tag.id.clone())
            .collect()
    }
}

/// A thread to be opened in a forum channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub name: String,
    pub content: String,
    pub applied_tags: Vec<String>,
    pub auto_archive_minutes: u32,
}

/// A thread the forum reported as created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedThread {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ForumChannel {
        serde_json::from_str(
            r#"{"id":"1","type":15,"available_tags":[
                {"id":"10","name":"Proposal","moderated":false},
                {"id":"11","name":"Pending"},
                {"id":"12","name":"Live"},
                {"id":"13","name":"Off-topic"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_tag_ids_keep_channel_order_and_drop_unknown() {
        let ids = channel().tag_ids_for(&["Live", "Proposal", "Missing"]);
        assert_eq!(ids, vec!["10".to_string(), "12".to_string()]);
    }
}
