//! Natural Language Querying (NLQ)
//!
//! Text-to-Cypher with execution feedback: a synthesizer proposes a query,
//! the executor runs it, syntax failures are fed back for another try and a
//! successful result is narrated.

pub mod executor;
pub mod narrator;
pub mod repair;
pub mod synthesizer;

pub use executor::{Execution, QueryExecutor};
pub use narrator::ResultNarrator;
pub use repair::{
    Attempt, AttemptOutcome, LoopPhase, QueryObserver, RepairLoop, RepairOutcome, RepairReport,
    EXHAUSTED_MESSAGE,
};
pub use synthesizer::QuerySynthesizer;
