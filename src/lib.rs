pub mod core;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod state;
