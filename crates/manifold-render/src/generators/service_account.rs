//! The service account every pod runs as.

use k8s_openapi::api::core::v1::ServiceAccount;

use super::object_meta;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let account = ServiceAccount {
        metadata: object_meta(
            values.service_id.as_str(),
            values,
            config.common_labels(&values.metadata),
            values.service_account.annotations.clone(),
        ),
        ..Default::default()
    };
    Ok(vec![Manifest::from_resource(&account)?])
}
