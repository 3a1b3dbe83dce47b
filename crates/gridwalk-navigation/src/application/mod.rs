//! Application services: command and query handlers over an event repository.

pub mod command_handlers;
pub mod query_handlers;
