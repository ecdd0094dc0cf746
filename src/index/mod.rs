pub mod pinecone;
pub mod store;

pub use pinecone::PineconeIndex;
pub use store::{IndexMatch, IndexStats, UpsertRecord, VectorIndex};
