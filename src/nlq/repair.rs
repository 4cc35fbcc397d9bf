//! Bounded synthesize → execute → correct cycle
//!
//! ```text
//! Synthesizing ──> Executing ──┬──> Succeeded
//!      ^                       ├──> Retrying ──> Synthesizing
//!      │                       └──> Exhausted
//!      └─────────────────────────────┘
//! ```
//!
//! Only the most recent failure is kept as corrective history; each retry
//! replaces the previous correction turns.

use crate::conversation::ChatTurn;
use crate::error::QaResult;
use crate::nlq::executor::{Execution, QueryExecutor};
use crate::nlq::narrator::ResultNarrator;
use crate::nlq::synthesizer::QuerySynthesizer;
use crate::result::ResultSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Answer returned when every attempt produced malformed Cypher
pub const EXHAUSTED_MESSAGE: &str = "Invalid Cypher syntax after multiple attempts.";

#[derive(Debug)]
enum LoopState {
    Synthesizing,
    Executing(String),
    Retrying { failed_query: String, message: String },
    Succeeded(ResultSet),
    Exhausted,
}

/// Data-free view of a loop state, recorded for every state visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Synthesizing,
    Executing,
    Retrying,
    Succeeded,
    Exhausted,
}

impl LoopState {
    fn phase(&self) -> LoopPhase {
        match self {
            LoopState::Synthesizing => LoopPhase::Synthesizing,
            LoopState::Executing(_) => LoopPhase::Executing,
            LoopState::Retrying { .. } => LoopPhase::Retrying,
            LoopState::Succeeded(_) => LoopPhase::Succeeded,
            LoopState::Exhausted => LoopPhase::Exhausted,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(ResultSet),
    SyntaxFailure(String),
}

/// One generated query and what the database made of it
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// 1-based
    pub number: u32,
    pub query: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Answered,
    Exhausted,
}

/// Everything one run of the loop produced
#[derive(Debug, Clone)]
pub struct RepairReport {
    pub answer: String,
    pub outcome: RepairOutcome,
    pub attempts: Vec<Attempt>,
    pub phases: Vec<LoopPhase>,
}

/// Notified of every generated query before it is sent to the database
pub trait QueryObserver: Send + Sync {
    fn query_generated(&self, attempt: u32, query: &str);
}

pub struct RepairLoop {
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
    narrator: ResultNarrator,
    max_attempts: u32,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl RepairLoop {
    pub fn new(
        synthesizer: QuerySynthesizer,
        executor: QueryExecutor,
        narrator: ResultNarrator,
        max_attempts: u32,
    ) -> Self {
        Self {
            synthesizer,
            executor,
            narrator,
            max_attempts: max_attempts.max(1),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn QueryObserver>) {
        self.observer = Some(observer);
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Answer `question` against the schema rendered as `grounding`.
    ///
    /// Exhaustion is a normal return; only fatal database or inference
    /// errors come back as `Err`.
    pub async fn run(&self, question: &str, grounding: &str) -> QaResult<RepairReport> {
        let mut state = LoopState::Synthesizing;
        let mut failures = 0u32;
        let mut history: Vec<ChatTurn> = Vec::new();
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut phases: Vec<LoopPhase> = Vec::new();

        loop {
            phases.push(state.phase());
            state = match state {
                LoopState::Synthesizing => {
                    let query = self.synthesizer.synthesize(question, grounding, &history).await?;
                    info!(attempt = attempts.len() + 1, "Generated query:\n{}", query);
                    LoopState::Executing(query)
                }
                LoopState::Executing(query) => {
                    let number = attempts.len() as u32 + 1;
                    if let Some(observer) = &self.observer {
                        observer.query_generated(number, &query);
                    }
                    match self.executor.execute(&query).await? {
                        Execution::Success(result) => {
                            attempts.push(Attempt {
                                number,
                                query,
                                outcome: AttemptOutcome::Success(result.clone()),
                            });
                            LoopState::Succeeded(result)
                        }
                        Execution::SyntaxFailure(message) => {
                            failures += 1;
                            attempts.push(Attempt {
                                number,
                                query: query.clone(),
                                outcome: AttemptOutcome::SyntaxFailure(message.clone()),
                            });
                            if failures >= self.max_attempts {
                                LoopState::Exhausted
                            } else {
                                warn!("Attempt {} failed. Retrying...", failures);
                                LoopState::Retrying { failed_query: query, message }
                            }
                        }
                    }
                }
                LoopState::Retrying { failed_query, message } => {
                    history = QuerySynthesizer::correction_turns(question, grounding, &failed_query, &message);
                    LoopState::Synthesizing
                }
                LoopState::Succeeded(result) => {
                    let answer = self.narrator.narrate(question, &result).await?;
                    return Ok(RepairReport {
                        answer,
                        outcome: RepairOutcome::Answered,
                        attempts,
                        phases,
                    });
                }
                LoopState::Exhausted => {
                    warn!("Giving up after {} malformed queries", failures);
                    return Ok(RepairReport {
                        answer: EXHAUSTED_MESSAGE.to_string(),
                        outcome: RepairOutcome::Exhausted,
                        attempts,
                        phases,
                    });
                }
            };
        }
    }
}
