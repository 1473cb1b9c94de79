use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::anti_raid::AntiRaidTracker;
use crate::audit::SecurityLog;
use crate::ids::{GuildId, UserId};
use crate::validation::{InputValidator, ValidateOptions};

const MESSAGE_MAX_LENGTH: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_is_bot: bool,
    /// `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MessageVerdict {
    Ignore,
    DeleteSpam,
    DeleteSuspicious { reason: String },
    Allow { sanitized: String },
}

/// Screens ordinary chat messages: spam first, then content.
pub struct MessageScreen {
    anti_raid: Arc<AntiRaidTracker>,
    validator: Arc<InputValidator>,
    audit: Arc<SecurityLog>,
}

impl MessageScreen {
    pub fn new(
        anti_raid: Arc<AntiRaidTracker>,
        validator: Arc<InputValidator>,
        audit: Arc<SecurityLog>,
    ) -> Self {
        Self {
            anti_raid,
            validator,
            audit,
        }
    }

    pub fn screen(&self, message: &IncomingMessage) -> MessageVerdict {
        if message.author_is_bot {
            return MessageVerdict::Ignore;
        }

        if let Some(guild) = message.guild_id {
            let observation = self
                .anti_raid
                .detect_spam(message.author_id, guild, &message.content);
            if observation.spam {
                self.audit.log_spam_detected(
                    message.author_id,
                    &message.author_name,
                    guild,
                    observation.identical,
                );
                return MessageVerdict::DeleteSpam;
            }
        }

        // Links are normal in chat; code and markup are not.
        let opts = ValidateOptions {
            max_length: MESSAGE_MAX_LENGTH,
            allow_links: true,
            allow_code: false,
        };
        match self.validator.validate(&message.content, opts) {
            Ok(sanitized) => MessageVerdict::Allow { sanitized },
            Err(rejection) => {
                self.audit.log_suspicious_content(
                    message.author_id,
                    &message.author_name,
                    "message",
                    &rejection.reason,
                );
                MessageVerdict::DeleteSuspicious {
                    reason: rejection.reason,
                }
            }
        }
    }
}
