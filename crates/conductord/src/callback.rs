//! User-group callback consulted when tasks reference principals.
//!
//! At most one callback is registered per registry and an existing
//! registration is never replaced. The registry is passed explicitly to the
//! bootstrap; [`CallbackRegistry::global`] provides the process-wide
//! instance used by the daemon.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

/// Resolves whether users and groups exist and how they relate.
pub trait UserGroupCallback: Send + Sync {
    /// Returns `true` when `user_id` names a known user.
    fn exists_user(&self, user_id: &str) -> bool;

    /// Returns `true` when `group_id` names a known group.
    fn exists_group(&self, group_id: &str) -> bool;

    /// Groups `user_id` belongs to.
    fn groups_for_user(&self, user_id: &str) -> Vec<String>;
}

/// Built-in callback that accepts every user and group.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultUserGroupCallback;

impl DefaultUserGroupCallback {
    /// Identifier of the built-in callback.
    pub const IDENTIFIER: &'static str = "default";
}

impl UserGroupCallback for DefaultUserGroupCallback {
    fn exists_user(&self, _user_id: &str) -> bool {
        true
    }

    fn exists_group(&self, _group_id: &str) -> bool {
        true
    }

    fn groups_for_user(&self, _user_id: &str) -> Vec<String> {
        Vec::new()
    }
}

static GLOBAL: Lazy<Arc<CallbackRegistry>> = Lazy::new(|| Arc::new(CallbackRegistry::new()));

/// Single-assignment slot holding the active user-group callback.
#[derive(Default)]
pub struct CallbackRegistry {
    slot: OnceCell<Arc<dyn UserGroupCallback>>,
}

impl CallbackRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every bootstrap in the process.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Returns `true` once a callback has been registered.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Registers `callback` unless one is already present.
    ///
    /// Returns `true` when this call performed the registration. The check
    /// and the assignment happen atomically.
    pub fn register_if_absent(&self, callback: Arc<dyn UserGroupCallback>) -> bool {
        self.slot.set(callback).is_ok()
    }

    /// The registered callback, if any.
    #[must_use]
    pub fn callback(&self) -> Option<Arc<dyn UserGroupCallback>> {
        self.slot.get().cloned()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CallbackRegistry")
            .field("registered", &self.exists())
            .finish()
    }
}
