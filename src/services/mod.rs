pub mod csv_writer;
pub mod description;
pub mod image_resolver;
pub mod llm_service;
pub mod prompt_builder;
pub mod record_structurer;
pub mod response_reconciler;

pub use csv_writer::CsvWriter;
pub use llm_service::{GradingClient, GradingReply, GradingRequest, LlmService};
pub use prompt_builder::{build_prompt, GRADING_INSTRUCTIONS};
pub use record_structurer::structure_offer;
pub use response_reconciler::reconcile;
