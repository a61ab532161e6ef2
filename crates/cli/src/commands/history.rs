//! History command handler.

use clap::Args;
use tutor_core::{config::AppConfig, AppResult};
use tutor_knowledge::QueryHistory;

/// Show recent questions and answers
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Number of records to show
    #[arg(short = 'n', long, default_value_t = 5)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history command");

        let history = QueryHistory::new(config.history_path());
        let records = history.recent(self.limit)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!("No questions recorded yet ({})", history.path().display());
            return Ok(());
        }

        for record in records.iter().rev() {
            println!("[{}] {}", record.timestamp, record.question);
            println!("{}", record.answer);
            println!();
        }

        Ok(())
    }
}
