//! Shared utilities for the chat relay binaries.

pub mod logger;
