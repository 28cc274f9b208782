//! External secret projections for every container that declares them.

use std::collections::{BTreeMap, BTreeSet};

use manifold_core::{names, Labels};
use manifold_schema::ExternalSecretDefinition;

use super::object_meta;
use crate::config::RenderConfig;
use crate::crds::external_secret::{
    ExternalSecretData, ExternalSecretDataFrom, ExternalSecretSpec, ExternalSecretTarget,
    ExternalSecretTemplate, RemoteRef, SecretStoreRef,
};
use crate::crds::ExternalSecret;
use crate::error::{RenderError, Result};
use crate::manifest::Manifest;
use crate::values::{Container, DeploymentValues};

const DEFAULT_REFRESH_INTERVAL: &str = "1m";
const DEFAULT_STORE_KIND: &str = "ClusterSecretStore";

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values
        .all_containers()
        .iter()
        .any(|c| !c.external_secrets.is_empty())
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let containers = values.all_containers();
    check_unique_names(values, &containers)?;

    let mut out = Vec::new();
    for container in containers {
        for definition in &container.external_secrets {
            for (path, mapping) in &definition.mapping {
                let secret =
                    build_secret(values, config, container, definition, path, mapping.as_ref());
                out.push(Manifest::from_resource(&secret)?);
            }
        }
    }
    Ok(out)
}

/// Fail when two projections anywhere resolve to the same secret name.
fn check_unique_names(values: &DeploymentValues, containers: &[&Container]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for container in containers {
        for definition in &container.external_secrets {
            for path in definition.mapping.keys() {
                let store = &definition.secret_store.name;
                let name = names::external_secret_name(&values.service_id, store, path);
                if !seen.insert(name.clone()) {
                    return Err(RenderError::DuplicateSecret { name });
                }
            }
        }
    }
    Ok(())
}

fn build_secret(
    values: &DeploymentValues,
    config: &RenderConfig,
    container: &Container,
    definition: &ExternalSecretDefinition,
    path: &str,
    mapping: Option<&BTreeMap<String, Option<String>>>,
) -> ExternalSecret {
    let name = names::external_secret_name(&values.service_id, &definition.secret_store.name, path);
    let labels = Labels::from([("container".to_string(), container.name.clone())]);

    let mut spec = ExternalSecretSpec {
        refresh_interval: definition
            .refresh_interval
            .clone()
            .unwrap_or_else(|| DEFAULT_REFRESH_INTERVAL.to_string()),
        secret_store_ref: SecretStoreRef {
            name: definition.secret_store.name.clone(),
            kind: definition
                .secret_store
                .kind
                .clone()
                .unwrap_or_else(|| DEFAULT_STORE_KIND.to_string()),
        },
        target: ExternalSecretTarget {
            name: name.clone(),
            creation_policy: "Owner".to_string(),
            deletion_policy: "Delete".to_string(),
            template: None,
        },
        data: Vec::new(),
        data_from: Vec::new(),
    };

    match mapping {
        None => spec.data_from.push(ExternalSecretDataFrom {
            extract: RemoteRef::whole(path),
        }),
        Some(keys) => {
            let mut template = BTreeMap::new();
            for (env, property) in keys {
                let secret_key = env.to_lowercase();
                spec.data.push(ExternalSecretData {
                    secret_key: secret_key.clone(),
                    remote_ref: RemoteRef::property(path, property.as_deref().unwrap_or(env)),
                });
                template.insert(env.clone(), format!("{{{{ .{secret_key} }}}}"));
            }
            spec.target.template = Some(ExternalSecretTemplate {
                type_: "Opaque".to_string(),
                engine_version: "v2".to_string(),
                merge_policy: "Replace".to_string(),
                data: template,
            });
        }
    }

    ExternalSecret::new(
        object_meta(
            name,
            values,
            config.with_common_labels(&labels, &values.metadata),
            Labels::new(),
        ),
        spec,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    const SECRETS: &str = "
externalSecrets:
  - secretStore: {name: vault}
    mapping:
      apps/foo/db:
        DB_PASSWORD: password
        DB_USER:
      apps/foo/all:
sidecars:
  proxy:
    image: {repository: envoy, tag: v2}
    externalSecrets:
      - secretStore: {name: vault, kind: SecretStore}
        refreshInterval: 5m
        mapping:
          apps/proxy:
";

    #[test]
    fn applies_to_any_container() {
        assert!(!applies(&values("")));
        assert!(applies(&values(SECRETS)));
        assert!(applies(&values(
            "cronjobs:
  - name: c
    schedule: '* * * * *'
    image: {repository: r, tag: '1'}
    externalSecrets:
      - secretStore: {name: vault}
        mapping:
          x:
"
        )));
    }

    #[test]
    fn one_secret_per_path() {
        let out = generate(&values(SECRETS), &RenderConfig::default()).unwrap();
        let names: Vec<_> = out.iter().map(|m| m.name().unwrap()).collect();
        assert_eq!(
            names,
            [
                "foo--bar--test--vault--apps-foo-all",
                "foo--bar--test--vault--apps-foo-db",
                "foo--bar--test--vault--apps-proxy",
            ]
        );
        assert!(out.iter().all(|m| m.kind() == Some("ExternalSecret")));
        assert_eq!(out[0].api_version(), Some("external-secrets.io/v1"));
    }

    #[test]
    fn whole_secret_is_extracted() {
        let out = generate(&values(SECRETS), &RenderConfig::default()).unwrap();
        let secret: ExternalSecret = out[0].decode().unwrap();
        assert_eq!(secret.metadata.labels.as_ref().unwrap()["container"], "main");
        assert_eq!(secret.spec.refresh_interval, "1m");
        assert_eq!(secret.spec.secret_store_ref.kind, "ClusterSecretStore");
        assert_eq!(secret.spec.data_from[0].extract.key, "apps/foo/all");
        assert!(secret.spec.data.is_empty());
        assert!(secret.spec.target.template.is_none());
        assert_eq!(secret.spec.target.name, "foo--bar--test--vault--apps-foo-all");

        let proxy: ExternalSecret = out[2].decode().unwrap();
        assert_eq!(proxy.metadata.labels.as_ref().unwrap()["container"], "proxy");
        assert_eq!(proxy.spec.refresh_interval, "5m");
        assert_eq!(proxy.spec.secret_store_ref.kind, "SecretStore");
    }

    #[test]
    fn partial_secret_is_templated() {
        let out = generate(&values(SECRETS), &RenderConfig::default()).unwrap();
        let secret: ExternalSecret = out[1].decode().unwrap();
        let data = &secret.spec.data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].secret_key, "db_password");
        assert_eq!(data[0].remote_ref.key, "apps/foo/db");
        assert_eq!(data[0].remote_ref.property.as_deref(), Some("password"));
        assert_eq!(data[0].remote_ref.conversion_strategy.as_deref(), Some("Default"));
        assert_eq!(data[1].remote_ref.property.as_deref(), Some("DB_USER"));

        let template = secret.spec.target.template.unwrap();
        assert_eq!(template.type_, "Opaque");
        assert_eq!(template.engine_version, "v2");
        assert_eq!(template.data["DB_PASSWORD"], "{{ .db_password }}");
        assert_eq!(template.data["DB_USER"], "{{ .db_user }}");
    }

    #[test]
    fn duplicate_names_fail() {
        let values = values(
            "externalSecrets:
  - secretStore: {name: vault}
    mapping:
      shared/path:
initContainers:
  - name: init
    image: {repository: init, tag: '1'}
    externalSecrets:
      - secretStore: {name: vault}
        mapping:
          shared/path:
",
        );
        let err = generate(&values, &RenderConfig::default()).unwrap_err();
        assert!(
            matches!(&err, RenderError::DuplicateSecret { name } if name == "foo--bar--test--vault--shared-path"),
            "{err}"
        );
    }

    #[test]
    fn cronjob_path_collides_with_main_container() {
        let values = values(
            "externalSecrets:
  - secretStore: {name: vault}
    mapping:
      apps/foo/db:
cronjobs:
  - name: nightly
    schedule: '0 0 * * *'
    image: {repository: worker, tag: '1'}
    externalSecrets:
      - secretStore: {name: vault}
        mapping:
          apps/foo/db:
",
        );
        let err = generate(&values, &RenderConfig::default()).unwrap_err();
        assert!(
            matches!(&err, RenderError::DuplicateSecret { name } if name == "foo--bar--test--vault--apps-foo-db"),
            "{err}"
        );
    }

    #[test]
    fn job_path_collides_with_sidecar() {
        let values = values(
            "sidecars:
  proxy:
    image: {repository: envoy, tag: v2}
    externalSecrets:
      - secretStore: {name: vault}
        mapping:
          apps/shared:
preDeploymentJob:
  image: {repository: migrate, tag: '2'}
  externalSecrets:
    - secretStore: {name: vault, kind: SecretStore}
      mapping:
        apps/shared:
",
        );
        let err = generate(&values, &RenderConfig::default()).unwrap_err();
        assert!(
            matches!(&err, RenderError::DuplicateSecret { name } if name == "foo--bar--test--vault--apps-shared"),
            "{err}"
        );
    }

    #[test]
    fn distinct_paths_across_hosts_render() {
        let values = values(
            "externalSecrets:
  - secretStore: {name: vault}
    mapping:
      apps/main:
sidecars:
  proxy:
    image: {repository: envoy, tag: v2}
    externalSecrets:
      - secretStore: {name: vault}
        mapping:
          apps/proxy:
preDeploymentJob:
  image: {repository: migrate, tag: '2'}
  externalSecrets:
    - secretStore: {name: vault}
      mapping:
        apps/job:
cronjobs:
  - name: nightly
    schedule: '0 0 * * *'
    image: {repository: worker, tag: '1'}
    externalSecrets:
      - secretStore: {name: other}
        mapping:
          apps/main:
",
        );
        let out = generate(&values, &RenderConfig::default()).unwrap();
        let names: Vec<_> = out.iter().map(|m| m.name().unwrap()).collect();
        assert_eq!(
            names,
            [
                "foo--bar--test--vault--apps-main",
                "foo--bar--test--vault--apps-proxy",
                "foo--bar--test--vault--apps-job",
                "foo--bar--test--other--apps-main",
            ]
        );
    }
}
