pub mod embedding;
pub mod secondary;

pub use embedding::IEmbeddingProvider;
pub use secondary::ISecondaryClassifier;
