//! Name-based entry points over the registry

use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{registry, InvestigationKind};
use crate::result::{ExplanationResult, InvestigationResult};
use nowguard_client::RemoteDataClient;

/// Run the investigation registered under `name`
///
/// # Errors
/// `UnknownInvestigation` for unregistered names, otherwise whatever the
/// investigation itself returns.
pub async fn run(
    client: &dyn RemoteDataClient,
    name: &str,
    params: &InvestigationParams,
) -> Result<InvestigationResult> {
    let kind: InvestigationKind = name.parse()?;
    tracing::info!(investigation = %kind, "running investigation");
    let result = registry(kind).run(client, params).await?;
    tracing::info!(
        investigation = %kind,
        findings = result.finding_count,
        "investigation complete"
    );
    Ok(result)
}

/// Explain `element_id` with the investigation registered under `name`
///
/// # Errors
/// `UnknownInvestigation` for unregistered names, otherwise whatever the
/// investigation itself returns.
pub async fn explain(
    client: &dyn RemoteDataClient,
    name: &str,
    element_id: &str,
) -> Result<ExplanationResult> {
    let kind: InvestigationKind = name.parse()?;
    tracing::info!(investigation = %kind, element_id, "explaining finding");
    registry(kind).explain(client, element_id).await
}
