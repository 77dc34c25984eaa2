//! Named component factories for the pluggable strategy points.
//!
//! Escalation handlers, user directories and user-group callbacks are
//! selected by identifier from configuration. Each identifier maps to a
//! factory registered at startup; unknown identifiers are rejected instead
//! of being looked up dynamically.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::callback::{DefaultUserGroupCallback, UserGroupCallback};
use crate::service::{DefaultEscalationHandler, EscalationHandler, UserInfo};

/// Error type factories may return when construction fails.
pub type FactoryError = Box<dyn StdError + Send + Sync>;

type Factory<T> = Box<dyn Fn() -> Result<Box<T>, FactoryError> + Send + Sync>;

/// Errors raised while registering or instantiating components.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The identifier is unknown or its factory failed.
    #[error("invalid {role} component '{name}': {source}")]
    InvalidComponentConfiguration {
        /// Strategy point being resolved.
        role: &'static str,
        /// Identifier that was requested.
        name: String,
        /// Why construction failed.
        #[source]
        source: FactoryError,
    },
    /// A factory was already registered under the identifier.
    #[error("{role} component '{name}' is already registered")]
    Duplicate {
        /// Strategy point being populated.
        role: &'static str,
        /// Identifier registered twice.
        name: String,
    },
}

impl ComponentError {
    /// Identifier involved in the failure.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::InvalidComponentConfiguration { name, .. } | Self::Duplicate { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("no factory registered under this identifier")]
struct UnknownComponent;

/// Registry mapping identifiers to no-argument factories for one role.
pub struct ComponentRegistry<T: ?Sized> {
    role: &'static str,
    factories: BTreeMap<String, Factory<T>>,
}

impl<T: ?Sized> ComponentRegistry<T> {
    /// Builds an empty registry for the named strategy point.
    #[must_use]
    pub fn new(role: &'static str) -> Self {
        Self {
            role,
            factories: BTreeMap::new(),
        }
    }

    /// Strategy point served by this registry.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        self.role
    }

    /// Registers `factory` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Duplicate`] when `name` is already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), ComponentError>
    where
        F: Fn() -> Result<Box<T>, FactoryError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ComponentError::Duplicate {
                role: self.role,
                name,
            });
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Returns `true` when a factory exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds one instance of the component registered as `name`.
    ///
    /// An empty name disables the strategy point and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidComponentConfiguration`] when `name`
    /// is unknown or its factory fails.
    pub fn instantiate(&self, name: &str) -> Result<Option<Box<T>>, ComponentError> {
        if name.is_empty() {
            return Ok(None);
        }
        let invalid = |source: FactoryError| ComponentError::InvalidComponentConfiguration {
            role: self.role,
            name: name.to_owned(),
            source,
        };
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| invalid(Box::new(UnknownComponent)))?;
        factory().map(Some).map_err(invalid)
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRegistry<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ComponentRegistry")
            .field("role", &self.role)
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The three registries consulted by the bootstrap.
#[derive(Debug)]
pub struct Components {
    escalation_handlers: ComponentRegistry<dyn EscalationHandler>,
    user_info: ComponentRegistry<dyn UserInfo>,
    callbacks: ComponentRegistry<dyn UserGroupCallback>,
}

impl Components {
    /// Registries without any factories.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            escalation_handlers: ComponentRegistry::new("escalation handler"),
            user_info: ComponentRegistry::new("user info"),
            callbacks: ComponentRegistry::new("user group callback"),
        }
    }

    /// Registries holding the built-in escalation handler and callback.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut components = Self::empty();
        components.escalation_handlers.factories.insert(
            DefaultEscalationHandler::IDENTIFIER.to_owned(),
            Box::new(|| Ok(Box::new(DefaultEscalationHandler::new()) as Box<dyn EscalationHandler>)),
        );
        components.callbacks.factories.insert(
            DefaultUserGroupCallback::IDENTIFIER.to_owned(),
            Box::new(|| Ok(Box::new(DefaultUserGroupCallback) as Box<dyn UserGroupCallback>)),
        );
        components
    }

    /// Escalation handler factories.
    #[must_use]
    pub const fn escalation_handlers(&self) -> &ComponentRegistry<dyn EscalationHandler> {
        &self.escalation_handlers
    }

    /// Mutable access for registering escalation handlers.
    pub const fn escalation_handlers_mut(
        &mut self,
    ) -> &mut ComponentRegistry<dyn EscalationHandler> {
        &mut self.escalation_handlers
    }

    /// User directory factories.
    #[must_use]
    pub const fn user_info(&self) -> &ComponentRegistry<dyn UserInfo> {
        &self.user_info
    }

    /// Mutable access for registering user directories.
    pub const fn user_info_mut(&mut self) -> &mut ComponentRegistry<dyn UserInfo> {
        &mut self.user_info
    }

    /// User-group callback factories.
    #[must_use]
    pub const fn callbacks(&self) -> &ComponentRegistry<dyn UserGroupCallback> {
        &self.callbacks
    }

    /// Mutable access for registering user-group callbacks.
    pub const fn callbacks_mut(&mut self) -> &mut ComponentRegistry<dyn UserGroupCallback> {
        &mut self.callbacks
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::with_builtins()
    }
}
