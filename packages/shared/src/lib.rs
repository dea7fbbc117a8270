//! Shared utilities for the Subasta auction game server.
//!
//! Holds the pieces that are useful to any binary in the workspace:
//! clock abstraction for timer deadlines and logging setup.

pub mod logger;
pub mod time;
