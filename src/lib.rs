pub mod config;
pub mod document_processor;
pub mod models;
pub mod processing;
pub mod sources;
pub mod utils;
pub mod validation;

pub use config::ProcessorConfig;
pub use document_processor::DocumentProcessor;
pub use utils::DocumentError;
