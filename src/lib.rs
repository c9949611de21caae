//! Workspace-level test package. See `tests/` for the integration suites.
