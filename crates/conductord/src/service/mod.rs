//! Core task service wired together by the bootstrap.
//!
//! The task lifecycle engine lives elsewhere; this type carries what the
//! bootstrap hands over: the persistence unit, the optional escalation
//! policy and the principal directory shared with the transports.

mod escalation;

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::principals::{Principal, PrincipalMap};

pub use self::escalation::{DefaultEscalationHandler, EscalationHandler, UserInfo};

/// Handle on the named persistence unit backing task storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceContext {
    unit: String,
}

impl PersistenceContext {
    /// Opens a context for the named persistence unit.
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    /// Name of the persistence unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        self.unit.as_str()
    }
}

#[derive(Debug, Default)]
struct Directory {
    users: PrincipalMap,
    groups: PrincipalMap,
}

/// Task service core shared by every transport.
pub struct TaskService {
    persistence: PersistenceContext,
    escalation: Option<Box<dyn EscalationHandler>>,
    directory: RwLock<Directory>,
}

impl TaskService {
    /// Builds the service over a persistence context.
    ///
    /// Without an escalation handler, missed deadlines are not escalated.
    #[must_use]
    pub fn new(
        persistence: PersistenceContext,
        escalation: Option<Box<dyn EscalationHandler>>,
    ) -> Self {
        Self {
            persistence,
            escalation,
            directory: RwLock::new(Directory::default()),
        }
    }

    /// Persistence context the service writes through.
    #[must_use]
    pub const fn persistence(&self) -> &PersistenceContext {
        &self.persistence
    }

    /// Escalation policy, when one is configured.
    #[must_use]
    pub fn escalation_handler(&self) -> Option<&dyn EscalationHandler> {
        self.escalation.as_deref()
    }

    /// Registers users and groups in a single call.
    ///
    /// Existing entries with the same identifier are replaced.
    pub fn add_users_and_groups(&self, users: PrincipalMap, groups: PrincipalMap) {
        let mut directory = self
            .directory
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        directory.users.extend(users);
        directory.groups.extend(groups);
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.read_directory(|directory| directory.users.len())
    }

    /// Number of registered groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.read_directory(|directory| directory.groups.len())
    }

    /// Looks up a registered user.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<Principal> {
        self.read_directory(|directory| directory.users.get(id).cloned())
    }

    /// Looks up a registered group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<Principal> {
        self.read_directory(|directory| directory.groups.get(id).cloned())
    }

    fn read_directory<T>(&self, read: impl FnOnce(&Directory) -> T) -> T {
        let directory = self
            .directory
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        read(&directory)
    }
}

impl fmt::Debug for TaskService {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TaskService")
            .field("persistence", &self.persistence)
            .field(
                "escalation",
                &self.escalation.as_ref().map(|handler| handler.name()),
            )
            .field("users", &self.user_count())
            .field("groups", &self.group_count())
            .finish()
    }
}
