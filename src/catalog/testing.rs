//! Test utilities for the catalog module.
