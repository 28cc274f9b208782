//! Disruption budget of the workload pods.

use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec};
use manifold_core::Labels;

use super::{app_selector, object_meta};
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values.pod_disruption_budget.is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let Some(budget) = &values.pod_disruption_budget else {
        return Ok(Vec::new());
    };
    if budget.min_available.is_some() && budget.max_unavailable.is_some() {
        return Err(RenderError::ConflictingBudget);
    }

    let pdb = PodDisruptionBudget {
        metadata: object_meta(
            values.service_id.as_str(),
            values,
            config.common_labels(&values.metadata),
            Labels::new(),
        ),
        spec: Some(PodDisruptionBudgetSpec {
            selector: Some(app_selector(values.service_id.as_str())),
            ..budget.clone()
        }),
        ..Default::default()
    };
    Ok(vec![Manifest::from_resource(&pdb)?])
}
