use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{GuildId, UserId};

/// A command invocation as delivered by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub caller_id: UserId,
    #[serde(default)]
    pub caller_display_name: String,
    pub action_name: String,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub caller_is_admin: bool,
    /// Named string arguments of the command.
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

impl Action {
    pub fn new(caller_id: UserId, action_name: impl Into<String>) -> Self {
        Self {
            caller_id,
            caller_display_name: String::new(),
            action_name: action_name.into(),
            guild_id: None,
            caller_is_admin: false,
            payload: BTreeMap::new(),
        }
    }

    pub fn in_guild(mut self, guild: GuildId) -> Self {
        self.guild_id = Some(guild);
        self
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.caller_display_name = display_name.into();
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.caller_is_admin = true;
        self
    }

    pub fn with_arg(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(field.into(), value.into());
        self
    }
}
