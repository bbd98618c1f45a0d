pub mod camembert;
pub mod embedding;
pub mod embedding_model_factory;
pub mod encoder;
pub mod features;
pub mod model_files;
pub mod pooling;
pub mod settings;
pub mod splitter;
pub mod tokenizer_factory;
pub mod vector_mean;

pub use camembert::{Camembert, CamembertConfig, ModelArgs, TokenizerArgs};
pub use embedding::SentenceEmbedder;
pub use embedding_model_factory::OnnxEncoder;
pub use encoder::{Encoder, EncoderConfig};
pub use features::{SentenceFeatures, TokenEmbeddings};
pub use pooling::Pooling;
