pub mod client;
pub mod error;
pub mod session;

pub use client::ChatClient;
pub use error::ChatError;
pub use session::InterviewSession;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Speaker of a chat turn. The remote interviewer persona is `Assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the interview conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Closed set of interview categories understood by the chat endpoint.
/// Anything else is rejected at the boundary instead of silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewCategory {
    Behavioral,
    Technical,
    Coding,
    SystemDesign,
    Hr,
    Mixed,
}

impl InterviewCategory {
    /// Wire tag sent to the chat endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewCategory::Behavioral => "behavioral",
            InterviewCategory::Technical => "technical",
            InterviewCategory::Coding => "coding",
            InterviewCategory::SystemDesign => "system-design",
            InterviewCategory::Hr => "hr",
            InterviewCategory::Mixed => "mixed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InterviewCategory::Behavioral => "Behavioral",
            InterviewCategory::Technical => "Technical",
            InterviewCategory::Coding => "Coding",
            InterviewCategory::SystemDesign => "System Design",
            InterviewCategory::Hr => "HR",
            InterviewCategory::Mixed => "Mixed",
        }
    }

    pub const ALL: [InterviewCategory; 6] = [
        InterviewCategory::Behavioral,
        InterviewCategory::Technical,
        InterviewCategory::Coding,
        InterviewCategory::SystemDesign,
        InterviewCategory::Hr,
        InterviewCategory::Mixed,
    ];
}

impl fmt::Display for InterviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewCategory {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "behavioral" => Ok(InterviewCategory::Behavioral),
            "technical" => Ok(InterviewCategory::Technical),
            "coding" => Ok(InterviewCategory::Coding),
            "system-design" => Ok(InterviewCategory::SystemDesign),
            "hr" => Ok(InterviewCategory::Hr),
            "mixed" => Ok(InterviewCategory::Mixed),
            other => Err(ChatError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_wire_tag() {
        for category in InterviewCategory::ALL {
            assert_eq!(category.as_str().parse::<InterviewCategory>().ok(), Some(category));
        }
    }

    #[test]
    fn unknown_category_fails_fast() {
        let err = "trivia".parse::<InterviewCategory>().unwrap_err();
        assert!(matches!(err, ChatError::UnknownCategory(ref c) if c == "trivia"));
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        let json = serde_json::to_value(ChatMessage::assistant("hello")).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
