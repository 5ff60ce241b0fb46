//! CLI command implementations

pub mod call;
pub mod replay;
pub mod tools;

pub use call::call_command;
pub use replay::replay_command;
pub use tools::tools_command;
