//! Notification type definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Announcement,   // Admin broadcast to every active user
    PrivateMessage, // Admin message to one recipient
    NewComment,     // Someone commented on your content
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Announcement => "announcement",
            Self::PrivateMessage => "private_message",
            Self::NewComment => "new_comment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "announcement" => Some(Self::Announcement),
            "private_message" => Some(Self::PrivateMessage),
            "new_comment" => Some(Self::NewComment),
            _ => None,
        }
    }
}
