//! User and group directories loaded at startup.
//!
//! Loading is best-effort: a directory that cannot be read or understood is
//! replaced by an empty one so startup always proceeds.

mod expression;
mod loader;
mod model;
mod resource;

pub use self::expression::ExpressionError;
pub use self::loader::{PrincipalError, PrincipalFormat, PrincipalLoader};
pub use self::model::{Principal, PrincipalKind, PrincipalKindParseError, PrincipalMap};
pub use self::resource::{BundledResources, CLASSPATH_SCHEME, ResourceError, resolve_location};

const PRINCIPALS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::principals");
