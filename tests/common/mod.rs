//! In-process fakes for the database and inference capabilities

#![allow(dead_code)]

use async_trait::async_trait;
use cypher_qa::nlq::narrator::NARRATION_INSTRUCTION;
use cypher_qa::schema::{
    NODE_PROPERTIES_QUERY, RELATIONSHIP_PROPERTIES_QUERY, RELATIONSHIP_SHAPES_QUERY,
};
use cypher_qa::{
    CompletionRequest, DatabaseError, DatabaseResult, GraphDatabase, InferenceClient, LlmError,
    LlmResult, QaConfig, QueryParams, ResultSet,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub enum Reply {
    Rows(ResultSet),
    Syntax(String),
    Unavailable,
}

/// Database answering from a table of known statements.
///
/// Unknown statements are rejected as syntax errors.
pub struct FakeGraph {
    replies: Mutex<HashMap<String, Reply>>,
    executed: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl FakeGraph {
    pub fn new() -> Self {
        let graph = Self {
            replies: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        };
        graph.reply(NODE_PROPERTIES_QUERY, Reply::Rows(output_rows(vec![
            json!({"labels": "Person", "properties": ["name", "age"]}),
            json!({"labels": "Movie", "properties": ["title"]}),
        ])));
        graph.reply(RELATIONSHIP_PROPERTIES_QUERY, Reply::Rows(output_rows(vec![
            json!({"type": "ACTED_IN", "properties": ["roles"]}),
        ])));
        graph.reply(RELATIONSHIP_SHAPES_QUERY, Reply::Rows(output_rows(vec![
            json!({"source": "Person", "relationship": "ACTED_IN", "target": ["Movie"]}),
        ])));
        graph
    }

    pub fn reply(&self, query: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(query.to_string(), reply);
    }

    /// Statements run so far, metadata queries excluded
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

fn is_metadata(query: &str) -> bool {
    query == NODE_PROPERTIES_QUERY
        || query == RELATIONSHIP_PROPERTIES_QUERY
        || query == RELATIONSHIP_SHAPES_QUERY
}

#[async_trait]
impl GraphDatabase for FakeGraph {
    async fn run(&self, query: &str, _params: &QueryParams) -> DatabaseResult<ResultSet> {
        if !is_metadata(query) {
            self.executed.lock().unwrap().push(query.to_string());
        }
        match self.replies.lock().unwrap().get(query) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Syntax(message)) => Err(DatabaseError::from_status(
                "Neo.ClientError.Statement.SyntaxError",
                message.clone(),
            )),
            Some(Reply::Unavailable) => Err(DatabaseError::Connection("connection refused".to_string())),
            None => Err(DatabaseError::from_status(
                "Neo.ClientError.Statement.SyntaxError",
                "unexpected token",
            )),
        }
    }

    async fn verify(&self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn close(&self) -> DatabaseResult<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// LLM that returns scripted queries for synthesis calls and a deterministic
/// narration that echoes the rendered rows.
pub struct ScriptedLlm {
    queries: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(queries: &[&str]) -> Self {
        Self {
            queries: Mutex::new(queries.iter().map(|q| q.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn synthesis_requests(&self) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(|r| !is_narration(r)).collect()
    }

    pub fn narration_requests(&self) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(is_narration).collect()
    }
}

fn is_narration(request: &CompletionRequest) -> bool {
    request
        .turns
        .first()
        .map(|turn| turn.content == NARRATION_INSTRUCTION)
        .unwrap_or(false)
}

#[async_trait]
impl InferenceClient for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if is_narration(request) {
            let results = request.turns.last().map(|t| t.content.clone()).unwrap_or_default();
            return Ok(format!("Narrated. {}", results));
        }
        self.queries
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::ApiError("script exhausted".to_string()))
    }
}

pub fn output_rows(values: Vec<Value>) -> ResultSet {
    ResultSet::new(
        vec!["output".to_string()],
        values.into_iter().map(|v| vec![v]).collect(),
    )
    .unwrap()
}

pub fn count_rows(count: i64) -> ResultSet {
    ResultSet::new(vec!["count".to_string()], vec![vec![json!(count)]]).unwrap()
}

pub fn test_config() -> QaConfig {
    let mut config = QaConfig::default();
    config.llm.api_key = Some("sk-test".to_string());
    config
}
