//! Escalation handler seam invoked when a task misses a deadline.

use std::fmt;

use crate::principals::Principal;

/// Directory of contact details used when notifying escalation targets.
pub trait UserInfo: Send + Sync {
    /// Display name of `principal`, when known.
    fn display_name(&self, principal: &Principal) -> Option<String>;

    /// Email address of `principal`, when known.
    fn email_for(&self, principal: &Principal) -> Option<String>;
}

/// Policy applied to tasks whose deadlines expire.
pub trait EscalationHandler: Send + Sync {
    /// Identifier the handler is registered under.
    fn name(&self) -> &str;

    /// Returns `true` when the handler expects a [`UserInfo`] directory.
    fn requires_user_info(&self) -> bool {
        false
    }

    /// Attaches a user directory. Handlers that do not need one ignore it.
    fn set_user_info(&mut self, user_info: Option<Box<dyn UserInfo>>) {
        drop(user_info);
    }

    /// Returns `true` once a user directory is attached.
    fn has_user_info(&self) -> bool {
        false
    }
}

/// Built-in escalation policy that notifies through a [`UserInfo`] directory.
#[derive(Default)]
pub struct DefaultEscalationHandler {
    user_info: Option<Box<dyn UserInfo>>,
}

impl DefaultEscalationHandler {
    /// Identifier of the built-in handler.
    pub const IDENTIFIER: &'static str = "default";

    /// Builds a handler without a user directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The attached user directory, if any.
    #[must_use]
    pub fn user_info(&self) -> Option<&dyn UserInfo> {
        self.user_info.as_deref()
    }
}

impl fmt::Debug for DefaultEscalationHandler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DefaultEscalationHandler")
            .field("has_user_info", &self.user_info.is_some())
            .finish()
    }
}

impl EscalationHandler for DefaultEscalationHandler {
    fn name(&self) -> &str {
        Self::IDENTIFIER
    }

    fn requires_user_info(&self) -> bool {
        true
    }

    fn set_user_info(&mut self, user_info: Option<Box<dyn UserInfo>>) {
        self.user_info = user_info;
    }

    fn has_user_info(&self) -> bool {
        self.user_info.is_some()
    }
}
