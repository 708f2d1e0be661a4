//! Plain-text transcript export

use std::fs;
use std::path::{Path, PathBuf};

use tbl_ai::{Message, Role};

/// MIME type of the export artifact
pub const EXPORT_MIME_TYPE: &str = "text/plain";

const TITLE: &str = "Team Based Learning Conversation Export";
const RULE_WIDTH: usize = 50;

fn header() -> String {
    format!("{}\n{}\n\n", TITLE, "=".repeat(RULE_WIDTH))
}

fn separator() -> String {
    format!("\n\n{}\n\n", "-".repeat(RULE_WIDTH))
}

/// Render a transcript as a human-readable text blob
pub fn format_conversation(messages: &[Message]) -> String {
    let mut text = header();
    for message in messages {
        text.push_str(&message.role().as_str().to_uppercase());
        text.push_str(":\n");
        text.push_str(message.content());
        text.push_str(&separator());
    }
    text
}

/// Recover the (role, content) pairs from text produced by [`format_conversation`]
pub fn parse_conversation(text: &str) -> Vec<(Role, String)> {
    let header = header();
    let body = text.strip_prefix(header.as_str()).unwrap_or(text);

    body.split(separator().as_str())
        .filter_map(|entry| {
            let (label, content) = entry.split_once('\n')?;
            let role = Role::parse(label.strip_suffix(':')?)?;
            Some((role, content.to_string()))
        })
        .collect()
}

/// Sortable, filesystem-safe local timestamp (`YYYYMMDD_HHMMSS`)
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// File name for an export taken at `timestamp`
pub fn export_filename(timestamp: &str) -> String {
    format!("conversation_export_{}.txt", timestamp)
}

/// A formatted transcript ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationExport {
    pub filename: String,
    pub content: String,
}

impl ConversationExport {
    /// Format `messages` and name the export after the current time
    pub fn from_transcript(messages: &[Message]) -> Self {
        Self {
            filename: export_filename(&timestamp()),
            content: format_conversation(messages),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        EXPORT_MIME_TYPE
    }

    /// Write the export into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.content)?;
        tracing::info!(path = %path.display(), "Conversation exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<Message> {
        vec![
            Message::user("Hello"),
            Message::assistant("Hi there.\n\nI have had a fever for **three days**."),
            Message::user("Any allergies?\n"),
            Message::assistant(""),
        ]
    }

    #[test]
    fn test_format_layout() {
        let text = format_conversation(&[Message::user("Hello"), Message::assistant("Hi there")]);
        let rule = "-".repeat(50);
        let expected = format!(
            "Team Based Learning Conversation Export\n{}\n\nUSER:\nHello\n\n{}\n\nASSISTANT:\nHi there\n\n{}\n\n",
            "=".repeat(50),
            rule,
            rule
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_empty_is_header_only() {
        let text = format_conversation(&[]);
        assert!(text.starts_with("Team Based Learning Conversation Export\n"));
        assert!(parse_conversation(&text).is_empty());
    }

    #[test]
    fn test_parse_recovers_roles_and_content() {
        let messages = transcript();
        let parsed = parse_conversation(&format_conversation(&messages));
        let expected: Vec<(Role, String)> = messages
            .iter()
            .map(|m| (m.role(), m.content().to_string()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_export_filename_shape() {
        assert_eq!(
            export_filename("20250114_093005"),
            "conversation_export_20250114_093005.txt"
        );
        let ts = timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let export = ConversationExport::from_transcript(&transcript());
        assert_eq!(export.mime_type(), "text/plain");

        let path = export.write_to(&dir.path().join("exports")).unwrap();
        assert!(path.ends_with(&export.filename));
        assert_eq!(std::fs::read_to_string(path).unwrap(), export.content);
    }
}
