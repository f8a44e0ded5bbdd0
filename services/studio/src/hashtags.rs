//! Ordered, deduplicated hashtag set and the input editor that feeds it.

use serde::Serialize;

/// User action that submits the pending hashtag input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Enter,
    Comma,
    Blur,
}

impl SubmitTrigger {
    /// Map a key name to a submit trigger. Only Enter and `,` submit.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" => Some(SubmitTrigger::Enter),
            "," => Some(SubmitTrigger::Comma),
            _ => None,
        }
    }
}

/// Normalize raw input into a tag: trim, then strip one leading `#`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let tag = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Hashtags in insertion order, unique by exact match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HashtagSet {
    tags: Vec<String>,
}

impl HashtagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns `false` when the normalized input is empty or already present.
    pub fn add(&mut self, raw: &str) -> bool {
        let Some(tag) = normalize_tag(raw) else {
            return false;
        };
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove a tag by exact match. Returns whether anything was removed.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Comma-joined form used by the `hashtags` query parameter
    pub fn to_query(&self) -> String {
        self.tags.join(",")
    }
}

/// Text input bound to a [`HashtagSet`]
#[derive(Debug, Clone, Default)]
pub struct HashtagEditor {
    input: String,
    tags: HashtagSet,
}

impl HashtagEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Submit the pending input. The input is cleared only when a tag was added;
    /// the trigger itself carries no extra behaviour.
    pub fn submit(&mut self, _trigger: SubmitTrigger) -> bool {
        let added = self.tags.add(&self.input);
        if added {
            self.input.clear();
        }
        added
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn tags(&self) -> &HashtagSet {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_strips_hash_and_dedupes() {
        let mut set = HashtagSet::new();
        assert!(set.add("#Music"));
        assert!(!set.add("Music"));
        assert_eq!(set.as_slice(), ["Music".to_string()]);
    }

    #[test]
    fn test_add_rejects_empty() {
        let mut set = HashtagSet::new();
        assert!(!set.add(""));
        assert!(!set.add("   "));
        assert!(!set.add(" # "));
        assert!(!set.add("#"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_only_one_hash_stripped() {
        let mut set = HashtagSet::new();
        assert!(set.add("##dance"));
        assert_eq!(set.as_slice(), ["#dance".to_string()]);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let mut set = HashtagSet::new();
        assert!(set.add("music"));
        assert!(set.add("Music"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insertion_order_and_remove() {
        let mut set = HashtagSet::new();
        set.add("summer");
        set.add("beach");
        set.add("sunset");

        assert!(set.remove("beach"));
        assert!(!set.remove("beach"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["summer", "sunset"]);
        assert_eq!(set.to_query(), "summer,sunset");
    }

    #[test]
    fn test_editor_clears_input_only_on_add() {
        let mut editor = HashtagEditor::new();
        editor.set_input("  #travel ");
        assert!(editor.submit(SubmitTrigger::Enter));
        assert_eq!(editor.input(), "");

        editor.set_input("travel");
        assert!(!editor.submit(SubmitTrigger::Blur));
        assert_eq!(editor.input(), "travel");
    }

    #[test]
    fn test_triggers_behave_identically() {
        for trigger in [SubmitTrigger::Enter, SubmitTrigger::Comma, SubmitTrigger::Blur] {
            let mut editor = HashtagEditor::new();
            editor.set_input("#food");
            assert!(editor.submit(trigger));
            assert_eq!(editor.tags().as_slice(), ["food".to_string()]);
        }
    }

    #[test]
    fn test_trigger_from_key() {
        assert_eq!(SubmitTrigger::from_key("Enter"), Some(SubmitTrigger::Enter));
        assert_eq!(SubmitTrigger::from_key(","), Some(SubmitTrigger::Comma));
        assert_eq!(SubmitTrigger::from_key("Tab"), None);
    }
}
