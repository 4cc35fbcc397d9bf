//! Neo4j client over the transactional HTTP API
//!
//! Each `run` opens an explicit transaction (`POST /db/{db}/tx`), executes the
//! statement inside it and then commits (`POST {tx}/commit`) or rolls back
//! (`DELETE {tx}`) before returning.

use crate::config::DatabaseConfig;
use crate::database::{DatabaseError, DatabaseResult, GraphDatabase, QueryParams};
use crate::result::ResultSet;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct StatementsRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a QueryParams,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jFailure>,
    commit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jFailure {
    code: String,
    message: String,
}

impl TxResponse {
    /// First reported failure, classified by status code
    fn failure(&mut self) -> Option<DatabaseError> {
        if self.errors.is_empty() {
            return None;
        }
        let first = self.errors.swap_remove(0);
        Some(DatabaseError::from_status(first.code, first.message))
    }

    /// Materialize the result of the single statement that was sent
    pub(crate) fn into_result_set(mut self) -> DatabaseResult<ResultSet> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let result = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Protocol("response carried no statement result".to_string()))?;
        let rows = result.data.into_iter().map(|d| d.row).collect();
        Ok(ResultSet::new(result.columns, rows)?)
    }
}

/// HTTP client for a Neo4j server.
///
/// Holds one `reqwest::Client` for the lifetime of the session; transactions
/// are scoped to individual `run` calls.
pub struct Neo4jHttpClient {
    http_client: Client,
    base_url: String,
    database: String,
    username: String,
    password: Option<String>,
}

impl Neo4jHttpClient {
    /// Create a client for the server at `config.url` (e.g. `http://localhost:7474`)
    pub fn new(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn tx_endpoint(&self) -> String {
        format!("{}/db/{}/tx", self.base_url, self.database)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, self.password.as_deref())
    }

    async fn send(&self, request: RequestBuilder) -> DatabaseResult<TxResponse> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DatabaseError::Auth(format!("Neo4j returned {}", status)));
        }

        let body = response.text().await?;
        match serde_json::from_str::<TxResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                Err(DatabaseError::Protocol(format!("Neo4j returned {}: {}", status, body)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a scoped transaction
    async fn begin(&self) -> DatabaseResult<TxSession<'_>> {
        let request = self
            .http_client
            .post(self.tx_endpoint())
            .json(&StatementsRequest { statements: Vec::new() });
        let mut opened = self.send(request).await?;
        if let Some(err) = opened.failure() {
            return Err(err);
        }

        let commit_url = opened
            .commit
            .ok_or_else(|| DatabaseError::Protocol("transaction response has no commit URL".to_string()))?;
        let tx_url = commit_url.trim_end_matches("/commit").to_string();
        debug!(tx = %tx_url, "Opened transaction");

        Ok(TxSession {
            client: self,
            tx_url,
            commit_url,
        })
    }
}

/// An open transaction; consumed by `commit` or `rollback`
struct TxSession<'a> {
    client: &'a Neo4jHttpClient,
    tx_url: String,
    commit_url: String,
}

impl TxSession<'_> {
    async fn run(&self, query: &str, params: &QueryParams) -> DatabaseResult<ResultSet> {
        let request = self.client.http_client.post(&self.tx_url).json(&StatementsRequest {
            statements: vec![Statement {
                statement: query,
                parameters: params,
                result_data_contents: ["row"],
            }],
        });
        self.client.send(request).await?.into_result_set()
    }

    async fn commit(self) -> DatabaseResult<()> {
        let request = self
            .client
            .http_client
            .post(&self.commit_url)
            .json(&StatementsRequest { statements: Vec::new() });
        let mut response = self.client.send(request).await?;
        match response.failure() {
            Some(err) => Err(err),
            None => {
                debug!(tx = %self.tx_url, "Committed transaction");
                Ok(())
            }
        }
    }

    async fn rollback(self) -> DatabaseResult<()> {
        let response = self
            .client
            .authorized(self.client.http_client.delete(&self.tx_url))
            .send()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        // Neo4j already discards a transaction whose statement failed.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            debug!(tx = %self.tx_url, "Rolled back transaction");
            Ok(())
        } else {
            Err(DatabaseError::Protocol(format!(
                "rollback returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl GraphDatabase for Neo4jHttpClient {
    async fn run(&self, query: &str, params: &QueryParams) -> DatabaseResult<ResultSet> {
        let session = self.begin().await?;
        match session.run(query, params).await {
            Ok(result) => {
                session.commit().await?;
                Ok(result)
            }
            Err(err) => {
                if let Err(release_err) = session.rollback().await {
                    warn!("Failed to release transaction: {}", release_err);
                }
                Err(err)
            }
        }
    }
}
