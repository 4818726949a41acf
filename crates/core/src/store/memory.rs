use super::RecordStore;
use crate::types::{Evidence, Filter, InsertOutcome, Query, Record, RecordId};
use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-process record store.
///
/// Keeps records per evidence the way the remote server would (ids as
/// strings, codes in `kod`) and counts every delegated call.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    evidences: Mutex<HashMap<String, Vec<Record>>>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an evidence without counting it as a delegated call.
    pub fn seed(&self, evidence: &str, records: Vec<Record>) {
        let mut evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        let entry = evidences.entry(evidence.to_string()).or_default();
        for mut record in records {
            if !record.contains_key("id") {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                record.insert("id".to_string(), Value::String(id.to_string()));
            }
            entry.push(record);
        }
    }

    /// Number of trait calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self, evidence: &str) -> usize {
        let evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        evidences.get(evidence).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, evidence: &str) -> bool {
        self.len(evidence) == 0
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn record_id(record: &Record) -> Option<u64> {
    match record.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn matches_id(record: &Record, id: &RecordId) -> bool {
    match id {
        RecordId::Numeric(n) => record_id(record) == Some(*n),
        RecordId::Code(code) => field_str(record, "kod") == Some(code.as_str()),
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> Result<bool> {
    Ok(match filter {
        Filter::IdIn(ids) => record_id(record).is_some_and(|id| ids.contains(&id)),
        Filter::CodeEq(code) => field_str(record, "kod") == Some(code.as_str()),
        Filter::NameLike(name) => field_str(record, "nazev")
            .is_some_and(|n| n.to_lowercase().contains(&name.to_lowercase())),
        Filter::And(parts) => {
            for part in parts {
                if !matches_filter(record, part)? {
                    return Ok(false);
                }
            }
            true
        }
        Filter::Raw(expr) => bail!("raw filter expressions are not supported in memory: {}", expr),
    })
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list(&self, evidence: &Evidence, query: &Query) -> Result<Vec<Record>> {
        self.record_call();
        let evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        let Some(records) = evidences.get(evidence.as_str()) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for record in records {
            let keep = match &query.filter {
                Some(filter) => matches_filter(record, filter)?,
                None => true,
            };
            if keep {
                found.push(record.clone());
            }
        }
        if let Some(limit) = query.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn get(&self, evidence: &Evidence, id: &RecordId) -> Result<Option<Record>> {
        self.record_call();
        let evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        Ok(evidences
            .get(evidence.as_str())
            .and_then(|records| records.iter().find(|r| matches_id(r, id)))
            .cloned())
    }

    async fn insert(&self, evidence: &Evidence, mut record: Record) -> Result<InsertOutcome> {
        self.record_call();
        let mut evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        let records = evidences.entry(evidence.to_string()).or_default();

        if let Some(code) = field_str(&record, "kod") {
            if records.iter().any(|r| field_str(r, "kod") == Some(code)) {
                bail!("record with kod '{}' already exists in {}", code, evidence);
            }
        }

        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        record.insert("id".to_string(), Value::String(id.clone()));
        records.push(record);
        Ok(InsertOutcome { id: Some(id) })
    }

    async fn update(&self, evidence: &Evidence, id: &RecordId, fields: Record) -> Result<()> {
        self.record_call();
        let mut evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        let Some(record) = evidences
            .get_mut(evidence.as_str())
            .and_then(|records| records.iter_mut().find(|r| matches_id(r, id)))
        else {
            bail!("record {} not found in {}", id, evidence);
        };
        for (key, value) in fields {
            if key != "id" {
                record.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, evidence: &Evidence, id: &RecordId) -> Result<()> {
        self.record_call();
        let mut evidences = self.evidences.lock().unwrap_or_else(|e| e.into_inner());
        let Some(records) = evidences.get_mut(evidence.as_str()) else {
            bail!("record {} not found in {}", id, evidence);
        };
        let before = records.len();
        records.retain(|r| !matches_id(r, id));
        if records.len() == before {
            bail!("record {} not found in {}", id, evidence);
        }
        Ok(())
    }
}
