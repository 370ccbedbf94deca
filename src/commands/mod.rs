//! Command-set document model
//!
//! A command set is a named list of shell steps stored as a YAML document. The canonical
//! on-disk shape carries a list of versions, each with its own steps; a legacy bare shape
//! holds a single version at the top level. Both shapes flatten into a [`set::CommandSet`]
//! before anything is executed.
//!
//! Steps may carry per-platform variants of their shell text and a list of argument
//! definitions whose values are substituted into `{{name}}` placeholders.

pub mod command;
pub mod set;
