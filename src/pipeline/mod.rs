//! The retrieval-augmented answer pipeline: embed the question, search the
//! vector index, group hits by moon, then synthesize a reply.

pub mod aggregate;
pub mod orchestrator;
pub mod retrieval;
pub mod synthesis;
pub mod types;

pub use aggregate::{aggregate, GroupEntry, SubjectGroup};
pub use orchestrator::{
    Assistant, Conversation, Message, QueryOutcome, Response, NO_MATCH_MESSAGE, RESPONSE_HEADER,
};
pub use retrieval::Retriever;
pub use synthesis::Synthesizer;
pub use types::{ChunkMetadata, Match};
