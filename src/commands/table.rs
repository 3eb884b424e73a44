//! Command Registration Table
//!
//! Maps an uppercase command name to its arity contract and handler. The
//! table is built once at startup from the `COMMANDS` list each handler
//! module exports, so adding a command never touches the dispatcher.

use crate::commands::{keyspace, sets, strings, zsets, CommandError};
use crate::protocol::Reply;
use crate::storage::Store;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Handler callback: receives the arguments after the command name.
///
/// The argument count has already been checked against `min_args..=max_args`.
pub type HandlerFn = fn(&Store, &[Bytes]) -> Result<Reply, CommandError>;

/// Metadata and callback for one command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Canonical uppercase name
    pub name: &'static str,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments (None = unbounded)
    pub max_args: Option<usize>,
    /// Handler callback
    pub handler: HandlerFn,
}

impl CommandSpec {
    /// Checks an argument count against this command's arity.
    pub fn check_arity(&self, argc: usize) -> Result<(), CommandError> {
        let too_few = argc < self.min_args;
        let too_many = self.max_args.is_some_and(|max| argc > max);

        if too_few || too_many {
            Err(CommandError::WrongArity(self.name))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// The name → command lookup table.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: HashMap<&'static str, CommandSpec>,
}

impl CommandTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding every built-in command.
    pub fn builtin() -> Self {
        let mut table = Self::new();

        for spec in keyspace::COMMANDS
            .iter()
            .chain(strings::COMMANDS)
            .chain(zsets::COMMANDS)
            .chain(sets::COMMANDS)
        {
            table.register(*spec);
        }

        table
    }

    /// Registers a command, replacing any previous entry with the same name.
    pub fn register(&mut self, spec: CommandSpec) {
        self.entries.insert(spec.name, spec);
    }

    /// Looks up a command by name. Lookup is case-insensitive.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(name.to_ascii_uppercase().as_str()))
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
