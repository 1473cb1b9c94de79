//! Audit sinks.
//!
//! A sink only transports records. Failures are returned to the
//! [`SecurityLog`](crate::audit::SecurityLog), which reports them and moves on.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::audit::record::{EventKind, SecurityRecord, Severity};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait AuditSink: Send + Sync {
    /// Short label used in metrics and error logs.
    fn name(&self) -> &'static str;

    fn write(&self, record: &SecurityRecord) -> Result<(), AuditError>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Forwards records to `tracing` under the `guild_sentinel::audit` target.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn write(&self, record: &SecurityRecord) -> Result<(), AuditError> {
        let fields = serde_json::to_string(&record.fields)?;
        let user = record.user_id.map(|u| u.to_string()).unwrap_or_default();
        match record.level {
            Severity::Info => tracing::info!(
                target: "guild_sentinel::audit",
                id = %record.id,
                kind = %record.kind,
                user = %user,
                fields = %fields,
                "Security event"
            ),
            Severity::Warning => tracing::warn!(
                target: "guild_sentinel::audit",
                id = %record.id,
                kind = %record.kind,
                user = %user,
                fields = %fields,
                "Security event"
            ),
            Severity::Critical => tracing::error!(
                target: "guild_sentinel::audit",
                id = %record.id,
                kind = %record.kind,
                user = %user,
                fields = %fields,
                "Security event"
            ),
        }
        Ok(())
    }
}

/// Appends one JSON object per line. Incident-level records are also copied
/// to a second file when one is configured.
pub struct JsonLinesSink {
    security: Mutex<BufWriter<File>>,
    incidents: Option<Mutex<BufWriter<File>>>,
}

fn open_append(path: &Path) -> Result<BufWriter<File>, AuditError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

impl JsonLinesSink {
    pub fn open(security: &Path, incidents: Option<&Path>) -> Result<Self, AuditError> {
        Ok(Self {
            security: Mutex::new(open_append(security)?),
            incidents: incidents
                .map(open_append)
                .transpose()?
                .map(Mutex::new),
        })
    }
}

impl AuditSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "json_lines"
    }

    fn write(&self, record: &SecurityRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        {
            let mut writer = lock(&self.security);
            writeln!(writer, "{line}")?;
            writer.flush()?;
        }
        if let (Some(incidents), true) = (&self.incidents, record.level.is_incident()) {
            let mut writer = lock(incidents);
            writeln!(writer, "{line}")?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SecurityRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SecurityRecord> {
        lock(&self.records).clone()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<SecurityRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        lock(&self.records).iter().filter(|r| r.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write(&self, record: &SecurityRecord) -> Result<(), AuditError> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}
