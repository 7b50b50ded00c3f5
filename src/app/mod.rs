mod demo;
mod host;
mod init;
mod input;
mod render;
mod state;
mod step;
mod watchers;

pub use state::{App, DebugStats};
