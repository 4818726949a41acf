// Record operations shared by the typed and the generic evidence tools

use super::envelope::Payload;
use abraflexi_core::{Evidence, Query, Record, RecordId, RecordStore, ToolError};
use serde_json::Value;
use tracing::debug;

/// List records and report them with their count.
pub async fn fetch(
    store: &dyn RecordStore,
    evidence: &Evidence,
    query: &Query,
) -> Result<Payload, ToolError> {
    debug!(
        evidence = %evidence,
        filter = ?query.filter.as_ref().map(ToString::to_string),
        detail = %query.detail,
        limit = ?query.limit,
        "Fetching records"
    );

    let records = store
        .list(evidence, query)
        .await
        .map_err(ToolError::remote)?;

    let mut payload = scoped(evidence);
    payload.insert("count".to_string(), Value::from(records.len()));
    payload.insert(
        "records".to_string(),
        Value::Array(records.into_iter().map(Value::Object).collect()),
    );
    Ok(payload)
}

/// Insert a record; reports the remote id and the record code when one was set.
pub async fn create(
    store: &dyn RecordStore,
    evidence: &Evidence,
    record: Record,
) -> Result<Payload, ToolError> {
    let kod = record
        .get("kod")
        .and_then(Value::as_str)
        .map(str::to_string);

    let outcome = store
        .insert(evidence, record)
        .await
        .map_err(ToolError::remote)?;
    debug!(evidence = %evidence, id = ?outcome.id, "Record created");

    let mut payload = scoped(evidence);
    payload.insert(
        "id".to_string(),
        outcome.id.map(Value::String).unwrap_or(Value::Null),
    );
    if let Some(kod) = kod {
        payload.insert("kod".to_string(), Value::String(kod));
    }
    Ok(payload)
}

/// Overwrite fields of an existing record.
pub async fn update(
    store: &dyn RecordStore,
    evidence: &Evidence,
    id: &RecordId,
    fields: Record,
) -> Result<Payload, ToolError> {
    ensure_exists(store, evidence, id).await?;
    store
        .update(evidence, id, fields)
        .await
        .map_err(ToolError::remote)?;
    debug!(evidence = %evidence, id = %id, "Record updated");

    Ok(addressed(evidence, id))
}

/// Delete an existing record.
pub async fn delete(
    store: &dyn RecordStore,
    evidence: &Evidence,
    id: &RecordId,
) -> Result<Payload, ToolError> {
    ensure_exists(store, evidence, id).await?;
    store
        .delete(evidence, id)
        .await
        .map_err(ToolError::remote)?;
    debug!(evidence = %evidence, id = %id, "Record deleted");

    Ok(addressed(evidence, id))
}

async fn ensure_exists(
    store: &dyn RecordStore,
    evidence: &Evidence,
    id: &RecordId,
) -> Result<(), ToolError> {
    match store.get(evidence, id).await.map_err(ToolError::remote)? {
        Some(_) => Ok(()),
        None => Err(ToolError::NotFound {
            evidence: evidence.to_string(),
            identifier: id.to_string(),
        }),
    }
}

fn scoped(evidence: &Evidence) -> Payload {
    let mut payload = Payload::new();
    payload.insert(
        "evidence".to_string(),
        Value::String(evidence.as_str().to_string()),
    );
    payload
}

fn addressed(evidence: &Evidence, id: &RecordId) -> Payload {
    let mut payload = scoped(evidence);
    payload.insert("identifier".to_string(), Value::String(id.to_string()));
    payload
}
