//! Everything that produces suggestions by looking at the world:
//! generator scripts, in-process sources, filesystem listings and the
//! cache in front of them.

pub mod cache;
pub mod executor;
pub mod generators;
pub mod paths;
pub mod runner;
