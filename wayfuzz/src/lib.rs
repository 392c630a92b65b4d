pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{build_filter, build_options, handle_run, init_logging};
