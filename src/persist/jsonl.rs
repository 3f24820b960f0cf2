//! JSONL chunk store — the persistence boundary implementation.
//!
//! Each record family (nodes, edges) lives in its own chunk sequence
//! (`nodes-0000.jsonl`, `nodes-0001.jsonl`, ...) under the storage dir.
//! Files are append-mostly and rotate at the configured size or item
//! count. Backups are named directories holding the chunk set at capture
//! time.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::temporal::{TemporalRecord, TemporalType};
use crate::types::{Edge, GraphError, GraphResult, Node, PropertyValue};

/// Wire form of a node, one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node id.
    pub id: String,
    /// Node type tag.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Property map.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
    /// Optional embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            properties: node.properties.clone(),
            embeddings: node.embedding.clone(),
            created_at: node.created_at,
            updated_at: node.updated_at,
        }
    }
}

impl NodeRecord {
    /// Convert back into a graph node.
    pub fn into_node(self) -> Node {
        Node {
            id: self.id,
            node_type: self.node_type,
            properties: self.properties,
            embedding: self.embeddings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Wire form of an edge, one JSON object per line. Temporal fields are
/// present when the temporal layer tracks the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relation type tag.
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Weight.
    pub weight: f32,
    /// Property map.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
    /// Start of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    /// Temporal class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_type: Option<TemporalType>,
}

impl EdgeRecord {
    /// Build a record from an edge and its temporal metadata, if any.
    pub fn from_parts(edge: &Edge, temporal: Option<&TemporalRecord>) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            edge_type: edge.edge_type.clone(),
            weight: edge.weight,
            properties: edge.properties.clone(),
            created_at: edge.created_at,
            updated_at: edge.updated_at,
            valid_from: temporal.map(|t| t.valid_from),
            valid_until: temporal.and_then(|t| t.valid_until),
            temporal_type: temporal.map(|t| t.temporal_type),
        }
    }

    /// Convert back into a bare edge (temporal fields are applied by the
    /// temporal layer on restore).
    pub fn into_edge(self) -> Edge {
        Edge {
            id: self.id,
            source: self.source,
            target: self.target,
            edge_type: self.edge_type,
            weight: self.weight.max(0.0),
            properties: self.properties,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Filters for a resumable load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Maximum records returned. Default 1000.
    pub limit: usize,
    /// Records (post-filter) to skip; pairs with `limit` for resumption.
    pub offset: usize,
    /// Restrict to these type tags. None = all.
    pub types: Option<Vec<String>>,
    /// Only records updated at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            limit: 1000,
            offset: 0,
            types: None,
            since: None,
        }
    }
}

/// Outcome of a store call. Failures after retry surface here as counts,
/// not as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreReport {
    /// Records appended.
    pub written: usize,
    /// Records dropped after exhausting retries.
    pub failed: usize,
}

/// Counters over the chunk set.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    /// Node records across all node chunks.
    pub node_records: usize,
    /// Edge records across all edge chunks.
    pub edge_records: usize,
    /// Number of chunk files.
    pub file_count: usize,
    /// Total bytes across chunk files.
    pub total_bytes: u64,
}

const NODE_FAMILY: &str = "nodes";
const EDGE_FAMILY: &str = "edges";
const BACKUP_DIR: &str = "backups";
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_MS: u64 = 100;

/// The JSONL chunk store.
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    /// Open (creating if needed) a store at the configured directory.
    pub fn new(config: StorageConfig) -> GraphResult<Self> {
        fs::create_dir_all(&config.dir)?;
        Ok(Self { config })
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Append node records, rotating chunks as configured.
    pub fn store_nodes(&self, records: &[NodeRecord]) -> GraphResult<StoreReport> {
        self.append_family(NODE_FAMILY, records)
    }

    /// Append edge records, rotating chunks as configured.
    pub fn store_edges(&self, records: &[EdgeRecord]) -> GraphResult<StoreReport> {
        self.append_family(EDGE_FAMILY, records)
    }

    /// Load node records in chunk order. Bounded by `limit`; resumable
    /// via `offset`. Duplicated ids are returned as-is (append-mostly
    /// files; the caller keeps the last occurrence).
    pub fn load_nodes(&self, options: &LoadOptions) -> GraphResult<Vec<NodeRecord>> {
        self.load_family(NODE_FAMILY, options, |record: &NodeRecord| {
            type_and_time_match(&record.node_type, record.updated_at, options)
        })
    }

    /// Load edge records in chunk order.
    pub fn load_edges(&self, options: &LoadOptions) -> GraphResult<Vec<EdgeRecord>> {
        self.load_family(EDGE_FAMILY, options, |record: &EdgeRecord| {
            type_and_time_match(&record.edge_type, record.updated_at, options)
        })
    }

    /// Remove node records by id, compacting every chunk. Returns how many
    /// records were dropped.
    pub fn delete_nodes(&self, ids: &[String]) -> GraphResult<usize> {
        self.delete_family(NODE_FAMILY, |line| {
            serde_json::from_str::<NodeRecord>(line)
                .map(|r| ids.contains(&r.id))
                .unwrap_or(false)
        })
    }

    /// Remove edge records by id, compacting every chunk.
    pub fn delete_edges(&self, ids: &[String]) -> GraphResult<usize> {
        self.delete_family(EDGE_FAMILY, |line| {
            serde_json::from_str::<EdgeRecord>(line)
                .map(|r| ids.contains(&r.id))
                .unwrap_or(false)
        })
    }

    /// Counters over the current chunk set.
    pub fn stats(&self) -> GraphResult<StorageStats> {
        let mut stats = StorageStats {
            node_records: 0,
            edge_records: 0,
            file_count: 0,
            total_bytes: 0,
        };
        for family in [NODE_FAMILY, EDGE_FAMILY] {
            for path in self.chunk_files(family)? {
                stats.file_count += 1;
                stats.total_bytes += fs::metadata(&path)?.len();
                let lines = count_lines(&path)?;
                if family == NODE_FAMILY {
                    stats.node_records += lines;
                } else {
                    stats.edge_records += lines;
                }
            }
        }
        Ok(stats)
    }

    /// Copy the current chunk set into a named backup directory. Returns
    /// the backup name.
    pub fn create_backup(&self, name: Option<&str>) -> GraphResult<String> {
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("backup-{}", Utc::now().format("%Y%m%d%H%M%S")),
        };
        let backup_dir = self.config.dir.join(BACKUP_DIR).join(&name);
        fs::create_dir_all(&backup_dir)?;
        for family in [NODE_FAMILY, EDGE_FAMILY] {
            for path in self.chunk_files(family)? {
                if let Some(file_name) = path.file_name() {
                    fs::copy(&path, backup_dir.join(file_name))?;
                }
            }
        }
        Ok(name)
    }

    /// Replace the current chunk set with a named backup's.
    pub fn restore_from_backup(&self, name: &str) -> GraphResult<()> {
        let backup_dir = self.config.dir.join(BACKUP_DIR).join(name);
        if !backup_dir.is_dir() {
            return Err(GraphError::BackupNotFound(name.to_string()));
        }
        self.reset()?;
        for entry in fs::read_dir(&backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "jsonl").unwrap_or(false) {
                if let Some(file_name) = path.file_name() {
                    fs::copy(&path, self.config.dir.join(file_name))?;
                }
            }
        }
        Ok(())
    }

    /// Delete every chunk file (backups are kept).
    pub fn reset(&self) -> GraphResult<()> {
        for family in [NODE_FAMILY, EDGE_FAMILY] {
            for path in self.chunk_files(family)? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn append_family<T: Serialize>(&self, family: &str, records: &[T]) -> GraphResult<StoreReport> {
        let mut report = StoreReport::default();
        if records.is_empty() {
            return Ok(report);
        }

        let mut chunks = self.chunk_files(family)?;
        let mut index = chunks.len().saturating_sub(1);
        let mut current = match chunks.pop() {
            Some(path) => path,
            None => self.chunk_path(family, 0),
        };
        let mut items = if current.exists() {
            count_lines(&current)?
        } else {
            0
        };
        let mut bytes = if current.exists() {
            fs::metadata(&current)?.len()
        } else {
            0
        };

        for record in records {
            let line = match serde_json::to_string(record) {
                Ok(line) => line,
                Err(err) => {
                    warn!("skipping unserializable record: {err}");
                    report.failed += 1;
                    continue;
                }
            };

            if items >= self.config.max_items_per_file || bytes >= self.config.max_file_size {
                index += 1;
                current = self.chunk_path(family, index);
                items = 0;
                bytes = 0;
            }

            if self.append_line_with_retry(&current, &line) {
                report.written += 1;
                items += 1;
                bytes += line.len() as u64 + 1;
            } else {
                report.failed += 1;
            }
        }
        Ok(report)
    }

    fn append_line_with_retry(&self, path: &Path, line: &str) -> bool {
        for attempt in 0..RETRY_ATTEMPTS {
            match append_line(path, line) {
                Ok(()) => return true,
                Err(err) => {
                    warn!(
                        "append to {} failed (attempt {}/{}): {err}",
                        path.display(),
                        attempt + 1,
                        RETRY_ATTEMPTS
                    );
                    if attempt + 1 < RETRY_ATTEMPTS {
                        thread::sleep(Duration::from_millis(RETRY_BASE_MS << attempt));
                    }
                }
            }
        }
        false
    }

    fn load_family<T: DeserializeOwned>(
        &self,
        family: &str,
        options: &LoadOptions,
        keep: impl Fn(&T) -> bool,
    ) -> GraphResult<Vec<T>> {
        let mut records: Vec<T> = Vec::new();
        let mut skipped = 0usize;
        for path in self.chunk_files(family)? {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: T = serde_json::from_str(&line)?;
                if !keep(&record) {
                    continue;
                }
                if skipped < options.offset {
                    skipped += 1;
                    continue;
                }
                records.push(record);
                if records.len() >= options.limit {
                    return Ok(records);
                }
            }
        }
        Ok(records)
    }

    fn delete_family(&self, family: &str, should_drop: impl Fn(&str) -> bool) -> GraphResult<usize> {
        let mut dropped = 0usize;
        for path in self.chunk_files(family)? {
            let reader = BufReader::new(File::open(&path)?);
            let mut kept: Vec<String> = Vec::new();
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                if should_drop(&line) {
                    dropped += 1;
                } else {
                    kept.push(line);
                }
            }
            let mut content = kept.join("\n");
            if !content.is_empty() {
                content.push('\n');
            }
            fs::write(&path, content)?;
        }
        Ok(dropped)
    }

    fn chunk_path(&self, family: &str, index: usize) -> PathBuf {
        self.config.dir.join(format!("{family}-{index:04}.jsonl"))
    }

    fn chunk_files(&self, family: &str) -> GraphResult<Vec<PathBuf>> {
        let prefix = format!("{family}-");
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(".jsonl") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

fn count_lines(path: &Path) -> GraphResult<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0usize;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

fn type_and_time_match(
    type_tag: &str,
    updated_at: DateTime<Utc>,
    options: &LoadOptions,
) -> bool {
    if let Some(types) = &options.types {
        if !types.iter().any(|t| t == type_tag) {
            return false;
        }
    }
    if let Some(since) = options.since {
        if updated_at < since {
            return false;
        }
    }
    true
}
