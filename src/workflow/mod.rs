pub mod extraction_flow;
pub mod selectors;
pub mod settle;
pub mod source_ctx;
pub mod title;

pub use extraction_flow::{ExtractionError, ExtractionFlow, ExtractionState, FlowOutcome, FlowSettings};
pub use selectors::Selectors;
pub use settle::{SettleCondition, SettleMode, SettlePolicy};
pub use source_ctx::SourceCtx;
