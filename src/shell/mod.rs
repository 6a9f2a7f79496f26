//! External command execution and host environment queries.

pub mod command;
pub mod host;
pub mod platform;

pub use command::{
    display_command, execute, exit_status_label, CommandOptions, CommandResult, CommandRunner,
    SystemRunner,
};
pub use host::{resolve_tool_path, HostEnv};
pub use platform::{env_lookup, expand_env_vars, is_elevated};
