//! Test suites for the task service bootstrap.

pub(crate) mod support;
