//! Index command handler.
//!
//! Builds the vector index if needed (or from scratch with `--rebuild`) and
//! prints its diagnostics.

use clap::Args;
use tutor_core::{config::AppConfig, AppResult};
use tutor_knowledge::{create_provider, ensure_index, index_details, BuildOptions, IndexDetails};

/// Build or inspect the vector index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Drop the stored collection and build it again
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");
        tracing::debug!("Index command options: {:?}", self);

        let embedder = create_provider(&config).await?;
        let handle = ensure_index(
            &config.source_path(),
            &config,
            embedder.as_ref(),
            BuildOptions {
                rebuild: self.rebuild,
            },
        )
        .await?;

        let index = &handle.index;
        let details = index_details(index.as_ref(), &config.persist_path());

        if self.json {
            let output = serde_json::json!({
                "reused": handle.reused,
                "collection": index.collection(),
                "embeddingModel": embedder.model_name(),
                "details": details,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!(
            "{} collection '{}' ({} chunks)",
            if handle.reused { "Reused" } else { "Built" },
            index.collection(),
            handle.count
        );
        print_details(&details);

        Ok(())
    }
}

fn print_details(details: &IndexDetails) {
    println!("Location: {}", details.location.display());

    if let Some(ref error) = details.error {
        println!("Error reading index: {}", error);
        return;
    }

    println!("Documents: {}", details.document_count);
    if !details.sample_ids.is_empty() {
        println!("Sample ids:");
        for id in &details.sample_ids {
            println!("  - {}", id);
        }
    }
}
