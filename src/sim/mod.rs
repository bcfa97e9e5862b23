//! Quoting process simulation

pub mod model;
pub mod quote;
pub mod random;
pub mod stats;

pub use model::{CompilationModel, ErrorModel, Gaussian, PhaseModel, QuoteModel, MAX_INTERACTIONS};
pub use quote::{simulate_quote, ItemRun, Phase, QuotingError, Simulator, TrialResult};
pub use random::{MeanSource, RandomSource, RngSource};
pub use stats::{summarize, summarize_items, summarize_overall, ItemSummary, OverallSummary, TrialSummary};
