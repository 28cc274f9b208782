//! Managed postgres cluster.

use manifold_core::Labels;
use serde_json::Value;

use super::object_meta;
use crate::config::RenderConfig;
use crate::crds::postgres::{
    merge_override, PostgresResources, PostgresSpec, PostgresVolume, PostgresqlParam,
};
use crate::crds::Postgresql;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values.db.as_ref().is_some_and(|db| db.enabled)
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let Some(db) = values.db.as_ref().filter(|db| db.enabled) else {
        return Ok(Vec::new());
    };

    let spec = PostgresSpec {
        team_id: values.metadata.namespace.clone(),
        postgresql: PostgresqlParam {
            version: db.version.to_string(),
        },
        number_of_instances: db.replicas,
        volume: PostgresVolume {
            size: db.size.clone(),
            storage_class: db.storage_class.clone(),
        },
        enable_logical_backup: db.backup.unwrap_or(false),
        users: db.users.clone(),
        databases: db.databases.clone(),
        resources: PostgresResources::default(),
    };
    let mut spec = serde_json::to_value(spec)?;
    if let Some(additional) = &db.additional_config {
        merge_override(&mut spec, &Value::Object(additional.clone()));
    }

    let cluster = Postgresql::new(
        object_meta(
            db.cluster_name.as_str(),
            values,
            config.common_labels(&values.metadata),
            Labels::new(),
        ),
        spec,
    );
    Ok(vec![Manifest::from_resource(&cluster)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    const DB: &str = "
db:
  enabled: true
  clusterName: foo-db
  replicas: 2
  version: 16
  size: 5Gi
  storageClass: fast
  backup: true
  users:
    app: [superuser, createdb]
  databases:
    app: app
";

    #[test]
    fn disabled_database_does_not_apply() {
        assert!(!applies(&values("")));
        assert!(!applies(&values(&DB.replace("enabled: true", "enabled: false"))));
        assert!(applies(&values(DB)));
    }

    #[test]
    fn builds_cluster_spec() {
        let out = generate(&values(DB), &RenderConfig::default()).unwrap();
        let cluster = &out[0];
        assert_eq!(cluster.api_version(), Some("acid.zalan.do/v1"));
        assert_eq!(cluster.kind(), Some("postgresql"));
        assert_eq!(cluster.name(), Some("foo-db"));

        let spec = cluster.get("spec").unwrap();
        assert_eq!(spec["teamId"], "apps");
        assert_eq!(spec["postgresql"]["version"], "16");
        assert_eq!(spec["numberOfInstances"], 2);
        assert_eq!(spec["volume"]["size"], "5Gi");
        assert_eq!(spec["volume"]["storageClass"], "fast");
        assert_eq!(spec["enableLogicalBackup"], true);
        assert_eq!(spec["users"]["app"][1], "createdb");
        assert_eq!(spec["databases"]["app"], "app");
        assert_eq!(spec["resources"]["limits"]["cpu"], "1");
    }

    #[test]
    fn additional_config_overrides() {
        let doc = format!(
            "{DB}  additionalConfig:
    numberOfInstances: 3
    resources:
      limits: {{memory: 2Gi}}
    patroni:
      synchronous_mode: true
"
        );
        let out = generate(&values(&doc), &RenderConfig::default()).unwrap();
        let spec = out[0].get("spec").unwrap();
        assert_eq!(spec["numberOfInstances"], 3);
        assert_eq!(spec["resources"]["limits"]["memory"], "2Gi");
        assert_eq!(spec["resources"]["limits"]["cpu"], "1");
        assert_eq!(spec["patroni"]["synchronous_mode"], true);
    }
}
