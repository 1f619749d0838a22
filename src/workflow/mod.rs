pub mod grading_flow;
pub mod offer_ctx;

pub use grading_flow::{GradingFlow, GradingSettings, ProcessResult};
pub use offer_ctx::OfferCtx;
