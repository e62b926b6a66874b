use serde::{Deserialize, Serialize};

/// What kind of thing a suggestion completes. Serialized names match the
/// wire protocol consumed by the shell integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Subcommand,
    Option,
    Argument,
    File,
    Folder,
    History,
}

impl SuggestionKind {
    /// Default icon shown when a suggestion carries none of its own.
    pub fn icon(&self) -> &'static str {
        match self {
            SuggestionKind::Subcommand => "⚡",
            SuggestionKind::Option => "🔧",
            SuggestionKind::Argument => "📝",
            SuggestionKind::File => "📄",
            SuggestionKind::Folder => "📁",
            SuggestionKind::History => "🕐",
        }
    }
}

fn default_priority() -> i32 {
    50
}

/// A single completion candidate.
///
/// `name` is the unique key within one result set; `insert_value`, when
/// present, is the exact text to splice into the command line instead of
/// `name` (used by path completion to rebuild the partial path the user
/// already typed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(
        rename = "insertValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub insert_value: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

impl Suggestion {
    pub fn new(name: impl Into<String>, kind: SuggestionKind, priority: i32) -> Self {
        Suggestion {
            name: name.into(),
            description: None,
            icon: None,
            kind,
            insert_value: None,
            priority,
        }
    }

    /// Subcommand candidate, default priority 100.
    pub fn subcommand(name: impl Into<String>) -> Self {
        Self::new(name, SuggestionKind::Subcommand, 100)
    }

    /// Option/flag candidate, default priority 80.
    pub fn option(name: impl Into<String>) -> Self {
        Self::new(name, SuggestionKind::Option, 80)
    }

    /// Plain argument value, default priority 50.
    pub fn argument(name: impl Into<String>) -> Self {
        Self::new(name, SuggestionKind::Argument, 50)
    }

    /// File entry, default priority 85.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, SuggestionKind::File, 85).with_description("File")
    }

    /// Directory entry, default priority 90.
    pub fn folder(name: impl Into<String>) -> Self {
        Self::new(name, SuggestionKind::Folder, 90).with_description("Directory")
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_insert_value(mut self, value: impl Into<String>) -> Self {
        self.insert_value = Some(value.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The text that replaces the current partial token on acceptance.
    pub fn insert_text(&self) -> &str {
        self.insert_value.as_deref().unwrap_or(&self.name)
    }

    /// Fill in the kind's default icon when none was provided.
    pub fn ensure_icon(&mut self) {
        if self.icon.is_none() {
            self.icon = Some(self.kind.icon().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&SuggestionKind::Option).unwrap();
        assert_eq!(json, "\"option\"");
        let kind: SuggestionKind = serde_json::from_str("\"folder\"").unwrap();
        assert_eq!(kind, SuggestionKind::Folder);
    }

    #[test]
    fn test_optional_fields_skipped() {
        let s = Suggestion::subcommand("commit");
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"name\":\"commit\""));
        assert!(json.contains("\"type\":\"subcommand\""));
        assert!(!json.contains("insertValue"));
        assert!(!json.contains("icon"));
    }

    #[test]
    fn test_priority_defaults_on_deserialize() {
        let s: Suggestion = serde_json::from_str(r#"{"name":"main","type":"argument"}"#).unwrap();
        assert_eq!(s.priority, 50);
    }

    #[test]
    fn test_insert_text_falls_back_to_name() {
        let s = Suggestion::folder("src/");
        assert_eq!(s.insert_text(), "src/");
        let s = s.with_insert_value("./src/");
        assert_eq!(s.insert_text(), "./src/");
    }
}
