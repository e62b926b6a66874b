//! Command grammars: the spec model, the builtin catalog, user spec
//! files and the registry the resolver walks.

pub mod builtin;
pub mod loader;
pub mod model;
pub mod registry;
