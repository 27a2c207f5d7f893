//! `GraphEngine`: the transactional facade
//!
//! The published graph is an `Arc<GraphMap>` behind a read-write lock. A write
//! batch holds the writer mutex, applies its statements to a fork of the
//! current snapshot and swaps the fork in only when every statement succeeded.
//! Readers clone the `Arc` and never wait for a batch to finish.
//!
//! Blob uploads happen before the writer mutex is taken and payload downloads
//! after the snapshot is released.

use crate::blob::BlobStore;
use crate::config::EngineConfig;
use crate::graph::{EntityKind, FileId, GraphError, GraphMap, GraphResult, StatusCode};
use crate::metrics::{GraphMetrics, MetricsSnapshot};
use crate::query::ast::Command;
use crate::query::executor::{MutQueryExecutor, QueryBatchResult, QueryExecutor, QueryResult};
use crate::query::parser::{CommandParser, PestCommandParser};
use crate::transaction::Transaction;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub struct GraphEngine {
    state: RwLock<Arc<GraphMap>>,
    writer: Mutex<()>,
    parser: Box<dyn CommandParser>,
    blobs: Option<Arc<dyn BlobStore>>,
    config: EngineConfig,
    /// Counters of committed batches plus lookups of every batch
    metrics: GraphMetrics,
}

impl GraphEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: RwLock::new(Arc::new(GraphMap::new())),
            writer: Mutex::new(()),
            parser: Box::new(PestCommandParser),
            blobs: None,
            config,
            metrics: GraphMetrics::new(),
        }
    }

    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn CommandParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current published state
    pub async fn snapshot(&self) -> Arc<GraphMap> {
        Arc::clone(&*self.state.read().await)
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        let graph = self.snapshot().await;
        self.metrics.snapshot(graph.nodes.len(), graph.edges.len())
    }

    /// Parse `text` and run it as one batch
    pub async fn execute(&self, text: &str) -> QueryBatchResult {
        match self.parser.parse(text) {
            Ok(commands) => self.execute_batch(commands).await,
            Err(e) => {
                debug!("Rejected script: {}", e);
                QueryBatchResult::rejected(StatusCode::BadRequest, e.to_string())
            }
        }
    }

    pub async fn execute_command(&self, command: Command) -> QueryBatchResult {
        self.execute_batch(vec![command]).await
    }

    /// Run `commands` in order as one atomic batch.
    ///
    /// On the first failing statement every effect of the batch is discarded
    /// and `items` ends with the failing statement's result.
    pub async fn execute_batch(&self, commands: Vec<Command>) -> QueryBatchResult {
        if let Some(max) = self.config.max_batch_size {
            if commands.len() > max {
                return QueryBatchResult::rejected(
                    StatusCode::BadRequest,
                    format!("batch of {} statements exceeds the limit of {}", commands.len(), max),
                );
            }
        }

        if let Err(e) = self.upload_data(&commands).await {
            warn!("Batch rejected before execution: {}", e);
            return QueryBatchResult::rejected(e.status(), e.to_string());
        }

        let outcome = if commands.iter().all(Command::is_read_only) {
            self.run_read_only(&commands).await
        } else {
            self.run_writes(&commands).await
        };

        let mut results = match outcome {
            Ok(results) => results,
            Err(e) => {
                error!("Batch aborted: {}", e);
                return QueryBatchResult::rejected(e.status(), e.to_string());
            }
        };

        self.load_payloads(&mut results).await;

        let mut batch = QueryBatchResult::new();
        for result in results {
            batch.push(result);
        }
        batch
    }

    async fn run_read_only(&self, commands: &[Command]) -> GraphResult<Vec<QueryResult>> {
        let graph = self.snapshot().await;
        let metrics = GraphMetrics::new();
        let mut tx = Transaction::new(commands.len());
        tx.begin().map_err(internal)?;

        let executor = QueryExecutor::new(&graph, &metrics);
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = executor.execute(command);
            let failed = result.is_err();
            results.push(into_result(command, result));
            if failed {
                break;
            }
        }

        // Selects change nothing; only their lookups are counted
        self.metrics.absorb_lookups(&metrics);
        if results.iter().all(QueryResult::is_ok) {
            tx.commit().map_err(internal)?;
        } else {
            tx.rollback().map_err(internal)?;
        }
        debug!("Read batch {} {}", tx.id(), tx.state());
        Ok(results)
    }

    async fn run_writes(&self, commands: &[Command]) -> GraphResult<Vec<QueryResult>> {
        let _writer = self.writer.lock().await;

        let mut working = self.snapshot().await.fork();
        let mut tx = Transaction::new(commands.len());
        tx.begin().map_err(internal)?;

        let mut results = Vec::with_capacity(commands.len());
        let mut failure = None;
        {
            let mut executor = MutQueryExecutor::new(&mut working, &self.config);
            for (i, command) in commands.iter().enumerate() {
                let result = executor.execute(command);
                if let Err(e) = &result {
                    failure = Some((i, e.clone()));
                }
                results.push(into_result(command, result));
                if failure.is_some() {
                    break;
                }
            }
        }

        match failure {
            None => {
                tx.commit().map_err(internal)?;
                self.metrics.absorb(working.metrics());
                let (nodes, edges) = (working.nodes.len(), working.edges.len());
                *self.state.write().await = Arc::new(working);
                info!(
                    "Batch {} committed: {} statements, {} nodes, {} edges",
                    tx.id(),
                    commands.len(),
                    nodes,
                    edges
                );
            }
            Some((index, e)) => {
                tx.rollback().map_err(internal)?;
                self.metrics.absorb_lookups(working.metrics());
                if matches!(e, GraphError::Internal(_)) {
                    error!("Batch {} statement {} failed: {}", tx.id(), index + 1, e);
                }
                warn!(
                    "Batch {} rolled back at statement {}/{}: {}",
                    tx.id(),
                    index + 1,
                    commands.len(),
                    e
                );
            }
        }
        Ok(results)
    }

    /// Store every data attachment of the batch under the id the executor
    /// will record for it
    async fn upload_data(&self, commands: &[Command]) -> GraphResult<()> {
        let attachments = commands.iter().flat_map(|command| match command {
            Command::AddNode(c)
            | Command::SetNode(c)
            | Command::UpsertNode(c)
            | Command::UpdateNode(c) => {
                c.data.iter().map(move |data| (c.key.as_str(), data)).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        });

        for (key, data) in attachments {
            let Some(blobs) = &self.blobs else {
                return Err(GraphError::BadRequest(
                    "data attachments require a blob store".to_string(),
                ));
            };
            let file_id =
                FileId::for_data(EntityKind::Node, key, &data.name, &self.config.data_extension);
            let stored = blobs
                .put(file_id.clone(), data.payload.clone())
                .await
                .map_err(|e| GraphError::Internal(e.to_string()))?;
            if stored != file_id {
                return Err(GraphError::Internal(format!(
                    "blob store renamed {} to {}",
                    file_id, stored
                )));
            }
            debug!("Uploaded {} ({} bytes)", file_id, data.payload.len());
        }
        Ok(())
    }

    /// Fill in payloads of `select ... return` data links
    async fn load_payloads(&self, results: &mut [QueryResult]) {
        for link in results.iter_mut().flat_map(|r| r.data_links.iter_mut()) {
            let Some(blobs) = &self.blobs else {
                link.error = Some("no blob store configured".to_string());
                continue;
            };
            match blobs.get(&link.link.file_id).await {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(payload) => link.payload = Some(payload),
                    Err(e) => link.error = Some(format!("invalid payload: {}", e)),
                },
                Err(e) => {
                    warn!("Data link {} unavailable: {}", link.link.file_id, e);
                    link.error = Some(e.to_string());
                }
            }
        }
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn into_result(command: &Command, result: GraphResult<QueryResult>) -> QueryResult {
    match result {
        Ok(result) => result,
        Err(e) => QueryResult::failed(command.kind(), &e).with_alias(command.alias()),
    }
}

fn internal(e: impl std::fmt::Display) -> GraphError {
    GraphError::Internal(e.to_string())
}
