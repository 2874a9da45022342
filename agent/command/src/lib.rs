//! Model backend that drives a command-line client as a child process.

pub mod command;

pub use command::{
    process::{CommandSpec, ProcessError},
    CommandBackend, CommandBackendBuilder,
};
