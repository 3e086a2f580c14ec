// private sub-module defined in other files
mod command;

// exports identifiers from private sub-modules in the current module namespace
pub use self::command::CommandExecutor;
