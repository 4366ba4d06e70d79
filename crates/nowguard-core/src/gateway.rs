//! Governed gateway over the remote record store
//!
//! The single entry point outer surfaces call. Every read goes through the
//! policy engine, every write through the write gate, and the two-step write
//! workflows through the shared [`WorkflowState`].

use crate::artifacts::ArtifactType;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::guarded::GuardedClient;
use nowguard_client::{
    field_str, AggregateRequest, AggregateStats, ClientError, EncodedQuery, GetOptions,
    QueryRequest, Record, RemoteDataClient,
};
use nowguard_investigate::{dispatch, ExplanationResult, InvestigationParams, InvestigationResult};
use nowguard_policy::{check_table_access, enforce_query_safety, mask_sensitive_fields, require_write};
use nowguard_state::{PendingUpdate, SeedLedger, WorkflowState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const PROPERTIES_TABLE: &str = "sys_properties";

/// Query results after policy has been applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernedPage {
    /// Masked records
    pub records: Vec<Record>,
    /// Total matches reported by the remote
    pub total_count: usize,
    /// Offset used
    pub offset: usize,
    /// Limit actually sent
    pub limit: usize,
    /// Non-fatal notices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Old and new value of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Current value, empty string when the field is absent
    pub old: Value,
    /// Proposed value
    pub new: Value,
}

/// Result of a preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePreview {
    /// Token to pass to [`Gateway::apply_update`]
    pub token: String,
    /// Target table
    pub table: String,
    /// Target record
    pub sys_id: String,
    /// Per-field diff
    pub diff: BTreeMap<String, FieldChange>,
}

/// Result of an applied update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedUpdate {
    /// Target table
    pub table: String,
    /// Target record
    pub sys_id: String,
    /// Masked record as stored
    pub record: Record,
}

/// Records created by a seed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Tag to pass to [`Gateway::cleanup_seed`]
    pub tag: String,
    /// Table seeded
    pub table: String,
    /// Identifiers of created records
    pub sys_ids: Vec<String>,
}

/// Result of a cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Tag cleaned up
    pub tag: String,
    /// Records deleted
    pub deleted_count: usize,
}

/// Result of an artifact toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleReport {
    /// Artifact identifier
    pub sys_id: String,
    /// Artifact kind
    pub artifact_type: ArtifactType,
    /// Backing table
    pub table: String,
    /// `active` before the update
    pub old_active: Value,
    /// `active` as stored after the update
    pub new_active: Value,
}

/// Result of a property update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Property name
    pub name: String,
    /// Property record identifier
    pub sys_id: String,
    /// Value before the update
    pub old_value: String,
    /// Value as stored after the update
    pub new_value: String,
}

/// Policy-governed access to the remote store
#[derive(Debug)]
pub struct Gateway<C> {
    config: Arc<GatewayConfig>,
    state: Arc<WorkflowState>,
    client: C,
}

impl<C: RemoteDataClient> Gateway<C> {
    /// Gateway with fresh workflow state sized from `config`
    #[must_use]
    pub fn new(config: GatewayConfig, client: C) -> Self {
        let state = Arc::new(WorkflowState::new(config.state.preview_ttl()));
        Self::with_state(Arc::new(config), state, client)
    }

    /// Gateway sharing existing configuration and workflow state
    #[inline]
    #[must_use]
    pub fn with_state(config: Arc<GatewayConfig>, state: Arc<WorkflowState>, client: C) -> Self {
        Self {
            config,
            state,
            client,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Shared workflow state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Underlying client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    fn write_gate(&self, table: &str, override_requested: bool) -> Result<()> {
        let policy = &self.config.policy;
        require_write(
            table,
            policy.environment,
            override_requested || policy.allow_writes_in_prod,
        )
        .map_err(|err| {
            tracing::warn!(table, environment = %policy.environment, "write blocked");
            err.into()
        })
    }

    // ---- governed reads -------------------------------------------------

    /// Fetch one record, masked
    ///
    /// # Errors
    /// `AccessDenied` for deny-listed tables; client errors verbatim.
    pub async fn get_record(&self, table: &str, id: &str, options: &GetOptions) -> Result<Record> {
        check_table_access(table)?;
        let record = self.client.get_record(table, id, options).await?;
        Ok(mask_sensitive_fields(&record))
    }

    /// Run a query under the safety policy
    ///
    /// The limit sent to the remote is the policy's effective limit.
    ///
    /// # Errors
    /// `AccessDenied`, `QuerySafetyViolation`, or client errors.
    pub async fn query_records(&self, request: &QueryRequest) -> Result<GovernedPage> {
        let safe = enforce_query_safety(
            &request.table,
            &request.filter,
            request.limit,
            &self.config.policy.query_safety(),
        )?;

        let mut governed = request.clone();
        governed.limit = Some(safe.effective_limit);
        tracing::debug!(
            table = %governed.table,
            limit = safe.effective_limit,
            capped = safe.capped,
            "query"
        );
        let page = self.client.query_records(&governed).await?;

        let mut warnings = Vec::new();
        if safe.capped {
            warnings.push(format!("Limit capped at {}", safe.effective_limit));
        }
        Ok(GovernedPage {
            records: page.records.iter().map(mask_sensitive_fields).collect(),
            total_count: page.total_count,
            offset: governed.offset,
            limit: safe.effective_limit,
            warnings,
        })
    }

    /// Aggregate over an accessible table
    ///
    /// # Errors
    /// `AccessDenied` or client errors.
    pub async fn aggregate(&self, request: &AggregateRequest) -> Result<AggregateStats> {
        check_table_access(&request.table)?;
        Ok(self.client.aggregate(request).await?)
    }

    // ---- preview / apply ------------------------------------------------

    /// Compute a diff and park the change under a fresh token
    ///
    /// # Errors
    /// `InvalidInput` for an empty change-set, `WriteGatingDenied`, or
    /// client errors from reading the current record.
    pub async fn preview_update(
        &self,
        table: &str,
        id: &str,
        changes: Map<String, Value>,
        override_requested: bool,
    ) -> Result<UpdatePreview> {
        if changes.is_empty() {
            return Err(GatewayError::InvalidInput(
                "changes must contain at least one field".to_string(),
            ));
        }
        self.write_gate(table, override_requested)?;

        let current = self
            .client
            .get_record(table, id, &GetOptions::default())
            .await?;
        let current = mask_sensitive_fields(&current);

        let diff = changes
            .iter()
            .map(|(field, new)| {
                let old = current
                    .get(field)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()));
                (
                    field.clone(),
                    FieldChange {
                        old,
                        new: new.clone(),
                    },
                )
            })
            .collect();

        let token = self.state.previews().create(PendingUpdate {
            table: table.to_string(),
            id: id.to_string(),
            changes,
        });
        tracing::info!(table, id, %token, "update previewed");

        Ok(UpdatePreview {
            token: token.to_string(),
            table: table.to_string(),
            sys_id: id.to_string(),
            diff,
        })
    }

    /// Redeem a preview token and write the parked change exactly once
    ///
    /// The token proves the write gate passed at preview time; only the
    /// deny-list is checked again here.
    ///
    /// # Errors
    /// `MalformedToken`, `InvalidOrExpiredToken`, `WriteGatingDenied`, or
    /// client errors from the update.
    pub async fn apply_update(&self, token: &str) -> Result<AppliedUpdate> {
        let pending = self.state.previews().redeem(token)?;
        require_write(&pending.table, self.config.policy.environment, true)?;

        let updated = self
            .client
            .update_record(&pending.table, &pending.id, &pending.changes)
            .await?;
        tracing::info!(table = %pending.table, id = %pending.id, "previewed update applied");

        Ok(AppliedUpdate {
            table: pending.table,
            sys_id: pending.id,
            record: mask_sensitive_fields(&updated),
        })
    }

    // ---- seed / cleanup -------------------------------------------------

    /// Create `records` in `table` and remember them under a tag
    ///
    /// Without `tag` a `seed-xxxxxxxx` tag is generated. If a create fails
    /// partway, the records created so far are still tracked before the
    /// error is returned.
    ///
    /// # Errors
    /// `WriteGatingDenied` or client errors.
    pub async fn seed_test_data(
        &self,
        table: &str,
        records: &[Record],
        tag: Option<&str>,
        override_requested: bool,
    ) -> Result<SeedReport> {
        self.write_gate(table, override_requested)?;

        let tag = match tag.map(str::trim) {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => SeedLedger::generate_tag(),
        };

        let mut sys_ids = Vec::with_capacity(records.len());
        let mut failure = None;
        for data in records {
            match self.client.create_record(table, data).await {
                Ok(created) => {
                    let id = field_str(&created, "sys_id");
                    if id.is_empty() {
                        failure = Some(GatewayError::Client(ClientError::ServerError(format!(
                            "created record in '{table}' has no sys_id"
                        ))));
                        break;
                    }
                    sys_ids.push(id);
                }
                Err(err) => {
                    failure = Some(err.into());
                    break;
                }
            }
        }

        if !sys_ids.is_empty() {
            self.state.seeds().track(&tag, table, sys_ids.clone());
        }
        if let Some(err) = failure {
            tracing::warn!(table, %tag, created = sys_ids.len(), error = %err, "seeding stopped early");
            return Err(err);
        }

        tracing::info!(table, %tag, created = sys_ids.len(), "test data seeded");
        Ok(SeedReport {
            tag,
            table: table.to_string(),
            sys_ids,
        })
    }

    /// Delete everything tracked under `tag`
    ///
    /// The tag is forgotten only when every delete succeeds.
    ///
    /// # Errors
    /// `UnknownSeedTag` or the first client error.
    pub async fn cleanup_seed(&self, tag: &str) -> Result<CleanupReport> {
        let entries = self.state.seeds().require(tag)?;

        let mut deleted_count = 0;
        for entry in &entries {
            for id in &entry.ids {
                if let Err(err) = self.client.delete_record(&entry.table, id).await {
                    tracing::warn!(%tag, table = %entry.table, id = %id, error = %err, "cleanup incomplete");
                    return Err(err.into());
                }
                deleted_count += 1;
            }
        }

        self.state.seeds().remove(tag);
        tracing::info!(%tag, deleted_count, "seeded records cleaned up");
        Ok(CleanupReport {
            tag: tag.to_string(),
            deleted_count,
        })
    }

    // ---- developer actions ----------------------------------------------

    /// Set the `active` flag on an artifact
    ///
    /// # Errors
    /// `InvalidInput` for unknown artifact types, `WriteGatingDenied`, or
    /// client errors.
    pub async fn toggle_artifact(
        &self,
        artifact_type: &str,
        id: &str,
        active: bool,
        override_requested: bool,
    ) -> Result<ToggleReport> {
        let kind: ArtifactType = artifact_type.parse()?;
        let table = kind.table();
        self.write_gate(table, override_requested)?;

        let current = self
            .client
            .get_record(table, id, &GetOptions::default())
            .await?;
        let old_active = current
            .get("active")
            .cloned()
            .unwrap_or_else(|| Value::String("unknown".to_string()));

        let mut change = Record::new();
        change.insert("active".to_string(), Value::String(active.to_string()));
        let updated = self.client.update_record(table, id, &change).await?;
        let new_active = updated
            .get("active")
            .cloned()
            .unwrap_or_else(|| Value::String(active.to_string()));

        tracing::info!(%kind, id, active, "artifact toggled");
        Ok(ToggleReport {
            sys_id: id.to_string(),
            artifact_type: kind,
            table: table.to_string(),
            old_active,
            new_active,
        })
    }

    /// Change a system property by name
    ///
    /// # Errors
    /// `InvalidInput` if the property does not exist, `WriteGatingDenied`,
    /// or client errors.
    pub async fn set_property(
        &self,
        name: &str,
        value: &str,
        override_requested: bool,
    ) -> Result<PropertyChange> {
        self.write_gate(PROPERTIES_TABLE, override_requested)?;

        let lookup = QueryRequest::new(PROPERTIES_TABLE, EncodedQuery::new().and("name", name))
            .with_limit(1);
        let page = self.client.query_records(&lookup).await?;
        let Some(property) = page.records.first() else {
            return Err(GatewayError::InvalidInput(format!(
                "Property '{name}' not found"
            )));
        };
        let sys_id = field_str(property, "sys_id");
        let old_value = field_str(property, "value");

        let mut change = Record::new();
        change.insert("value".to_string(), Value::String(value.to_string()));
        let updated = self
            .client
            .update_record(PROPERTIES_TABLE, &sys_id, &change)
            .await?;
        let new_value = match updated.get("value") {
            Some(_) => field_str(&updated, "value"),
            None => value.to_string(),
        };

        tracing::info!(name, "property updated");
        Ok(PropertyChange {
            name: name.to_string(),
            sys_id,
            old_value,
            new_value,
        })
    }

    // ---- investigations -------------------------------------------------

    /// Run an investigation by name through the guarded client
    ///
    /// # Errors
    /// Unknown names, invalid parameters, or mandatory query failures.
    pub async fn investigate_run(
        &self,
        name: &str,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let guarded = GuardedClient::new(&self.client);
        Ok(dispatch::run(&guarded, name, params).await?)
    }

    /// Explain one finding element through the guarded client
    ///
    /// # Errors
    /// Unknown names, malformed element ids, or mandatory query failures.
    pub async fn investigate_explain(
        &self,
        name: &str,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let guarded = GuardedClient::new(&self.client);
        Ok(dispatch::explain(&guarded, name, element_id).await?)
    }
}

/// Parse a JSON object of field changes
///
/// # Errors
/// `InvalidInput` if `raw` is not a JSON object.
pub fn parse_changes(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(GatewayError::InvalidInput(
            "changes must be a JSON object".to_string(),
        )),
        Err(err) => Err(GatewayError::InvalidInput(format!("malformed changes: {err}"))),
    }
}

/// Parse a JSON array of record objects
///
/// # Errors
/// `InvalidInput` if `raw` is not an array of JSON objects.
pub fn parse_records(raw: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| GatewayError::InvalidInput(format!("malformed records: {err}")))?;
    let Value::Array(items) = value else {
        return Err(GatewayError::InvalidInput(
            "records must be a JSON array".to_string(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(GatewayError::InvalidInput(format!(
                "record {index} is not a JSON object"
            ))),
        })
        .collect()
}
