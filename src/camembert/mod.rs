mod adapter;
mod config;

pub use adapter::{clamp_max_seq_length, Camembert};
pub use config::{CamembertConfig, ModelArgs, TokenizerArgs};

pub const CONFIG_FILE_NAME: &str = "sentence_camembert_config.json";
pub const DEFAULT_MAX_SEQ_LENGTH: usize = 128;
pub const MAX_SEQ_LENGTH_LIMIT: usize = 511; // 514 positions minus the special token slots
pub const SPECIAL_TOKEN_SLOTS: usize = 3;

pub const CLS_TOKEN: &str = "<s>";
pub const SEP_TOKEN: &str = "</s>";
pub const PAD_TOKEN: &str = "<pad>";
