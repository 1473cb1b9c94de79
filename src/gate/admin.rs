//! Administrative operations behind the gate.

use serde::{Deserialize, Serialize};

use crate::audit::{EventKind, SecurityRecord, SecurityReport, Severity};
use crate::gate::action::Action;
use crate::gate::security_gate::{SecurityGate, ADMIN_PERMISSION};
use crate::gate::verdict::Verdict;
use crate::ids::{GuildId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCommand {
    ResetRateLimits(UserId),
    ResetIncidents(UserId),
    Unlock(GuildId),
    Report,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum AdminOutcome {
    Done,
    Report(SecurityReport),
    Denied(Verdict),
}

impl SecurityGate {
    /// Run `command` on behalf of the caller of `action`.
    ///
    /// The action passes through [`check_security`](Self::check_security)
    /// first, and the caller must be an administrator. A locked guild
    /// denies everything, so an unlock has to come from outside the guild
    /// (`guild_id: None`).
    pub fn execute_admin(&self, action: &Action, command: AdminCommand) -> AdminOutcome {
        let verdict = self.check_security(action);
        if !verdict.allowed {
            return AdminOutcome::Denied(verdict);
        }
        if !action.caller_is_admin {
            self.audit.log_unauthorized_access(
                action.caller_id,
                &action.caller_display_name,
                &action.action_name,
                ADMIN_PERMISSION,
            );
            return AdminOutcome::Denied(Verdict::unauthorized(ADMIN_PERMISSION));
        }

        let by = action.caller_id.get();
        match command {
            AdminCommand::ResetRateLimits(user) => {
                self.limiter.reset(user);
                self.audit.log(
                    SecurityRecord::new(Severity::Info, EventKind::RateLimitsReset, Some(user))
                        .field("by", by),
                );
                AdminOutcome::Done
            }
            AdminCommand::ResetIncidents(user) => {
                self.audit.reset_user_incidents(user);
                AdminOutcome::Done
            }
            AdminCommand::Unlock(guild) => {
                let was_locked = self.anti_raid.disable_lockdown(guild);
                self.audit.log(
                    SecurityRecord::new(Severity::Info, EventKind::LockdownLifted, None)
                        .field("guild_id", guild.get())
                        .field("was_locked", was_locked)
                        .field("by", by),
                );
                AdminOutcome::Done
            }
            AdminCommand::Report => AdminOutcome::Report(self.audit.generate_report()),
        }
    }
}
