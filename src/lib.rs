pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod render;
pub mod terminal;

pub use client::{HttpTaskApi, NewTask, TaskApi};
pub use command::Command;
pub use dispatcher::{Console, StagedForm, TaskForm};
pub use error::{Result, ShellError};
pub use render::{MemoryTarget, RenderTarget, Rendering, ResultStore, Slot, Ticket};
