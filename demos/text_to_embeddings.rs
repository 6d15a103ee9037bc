//! End-to-end demo: chunk a document and fetch embeddings.
//!
//! With `OPENAI_API_KEY` set the demo talks to the real embedding service;
//! otherwise it falls back to the deterministic mock provider.
//!
//! ```sh
//! cargo run --example text_to_embeddings
//! ```

use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chunkmill::config::{ChunkingConfig, Credentials};
use chunkmill::embeddings::{MockEmbeddingProvider, OpenAiEmbeddingProvider, SharedEmbeddingProvider};
use chunkmill::pipeline::{PipelineInput, TextPipeline};
use chunkmill::types::PipelineError;

const SAMPLE: &str = "Rust is a systems programming language focused on safety and speed. \
It achieves memory safety without a garbage collector through ownership and borrowing. \
The borrow checker enforces these rules at compile time. \
Cargo is the Rust package manager and build tool. \
It downloads dependencies, compiles packages, and makes builds reproducible. \
The crates.io registry hosts tens of thousands of community packages.";

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let provider: SharedEmbeddingProvider = if env::var("OPENAI_API_KEY").is_ok() {
        Arc::new(OpenAiEmbeddingProvider::new(Credentials::from_env())?)
    } else {
        println!("OPENAI_API_KEY not set; using the mock provider");
        Arc::new(MockEmbeddingProvider::new())
    };

    let pipeline = TextPipeline::builder()
        .with_config(ChunkingConfig {
            max_tokens: 40,
            threshold: 0.8,
            ..Default::default()
        })
        .with_embedding_provider(provider)
        .with_concurrency_limit(8)
        .build();

    let table = pipeline
        .run(PipelineInput::Text(SAMPLE.to_string()))
        .await?;

    let stats = table.stats();
    println!(
        "{} rows, {} tokens total, {:.1} tokens on average",
        stats.rows, stats.total_tokens, stats.average_tokens
    );
    for record in table.records() {
        let dims = record
            .embedding
            .as_ref()
            .map(|vector| vector.len())
            .unwrap_or(0);
        let preview: String = record.text.chars().take(60).collect();
        println!("[{} tokens, {} dims] {}", record.token_count, dims, preview);
    }

    Ok(())
}
