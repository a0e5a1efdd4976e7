/*!
Terminal front end.

One stdin reader feeds both the command loop and the interface prompts: while a prompt is
waiting, the next line answers it instead of being parsed as a command.
*/

pub mod command;
pub mod prompt;
pub mod status;

pub use command::{ConsoleCommand, ConsoleError};
pub use prompt::ConsolePrompt;
pub use status::{ConsoleObserver, render_status};
