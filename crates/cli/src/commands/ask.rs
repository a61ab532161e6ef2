//! Ask command handler.
//!
//! Answers a single question from the terminal and records it in the history.

use clap::Args;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{BuildOptions, TutorContext};

/// Ask a single question about the textbook
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Print the retrieved context chunks after the answer
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let ctx = TutorContext::initialize(config, BuildOptions::default()).await?;

        let state = match ctx.ask(&self.question).await {
            Ok(state) => state,
            Err(AppError::EmptyInput) => {
                ctx.history().log_error("Empty question submitted", None);
                return Err(AppError::EmptyInput);
            }
            Err(e) => {
                ctx.history()
                    .log_error(&format!("Error generating answer: {}", e), Some(&self.question));
                return Err(e);
            }
        };

        ctx.record_answer(&state).await;

        if self.json {
            let context: Vec<_> = state
                .context
                .iter()
                .map(|chunk| {
                    serde_json::json!({
                        "id": chunk.id,
                        "page": chunk.metadata.page,
                        "text": chunk.text,
                    })
                })
                .collect();

            let output = serde_json::json!({
                "question": state.question,
                "answer": state.answer,
                "model": ctx.config().model,
                "context": context,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", state.answer);

        if self.show_context {
            for (i, chunk) in state.context.iter().enumerate() {
                println!();
                println!("[Chunk {} | page {}]", i + 1, chunk.metadata.page + 1);
                println!("{}", chunk.text.trim());
            }
        }

        Ok(())
    }
}
