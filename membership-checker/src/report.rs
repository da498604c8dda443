//! Debug progress message: sent once when a debug chain starts, edited after every step.

use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub(crate) struct DebugReport {
    /// Id of the sent progress message; `None` until sent, or if sending failed.
    pub message_id: Option<String>,
    /// Set after the first send attempt so a failed send is not retried on every step.
    pub started: bool,
    pub lines: Vec<String>,
}

impl DebugReport {
    pub fn render(&self, total: usize, footer: Option<&str>) -> String {
        let mut text = format!("Membership check: {}/{} chats", self.lines.len(), total);
        for line in &self.lines {
            let _ = write!(text, "\n{}", line);
        }
        if let Some(footer) = footer {
            let _ = write!(text, "\n\n{}", footer);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let report = DebugReport {
            message_id: Some("1".to_string()),
            started: true,
            lines: vec!["@a: member".to_string(), "@b: left".to_string()],
        };

        assert_eq!(
            report.render(3, None),
            "Membership check: 2/3 chats\n@a: member\n@b: left"
        );
        assert_eq!(
            report.render(2, Some("Missing: @b")),
            "Membership check: 2/2 chats\n@a: member\n@b: left\n\nMissing: @b"
        );
    }
}
