//! Command handlers for the tutor CLI.

pub mod ask;
pub mod history;
pub mod index;
pub mod serve;

pub use ask::AskCommand;
pub use history::HistoryCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;
