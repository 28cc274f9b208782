//! Extra role grants bound to the service account.

use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use manifold_core::{names, Labels};

use super::{non_empty_map, object_meta};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

pub(super) fn applies(values: &DeploymentValues) -> bool {
    let account = &values.service_account;
    account.additional_role.is_some() || account.additional_cluster_role.is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let account = &values.service_account;
    let labels = config.common_labels(&values.metadata);
    let mut out = Vec::new();

    if let Some(grant) = &account.additional_role {
        let (role_name, binding_name) = match &grant.name {
            Some(name) => (name.clone(), name.clone()),
            None => (
                names::role_name(&values.service_id),
                names::role_binding_name(&values.service_id),
            ),
        };
        let role = Role {
            metadata: object_meta(role_name.clone(), values, labels.clone(), Labels::new()),
            rules: Some(grant.rules.clone()),
        };
        let binding = RoleBinding {
            metadata: object_meta(binding_name, values, labels.clone(), Labels::new()),
            role_ref: role_ref("Role", role_name),
            subjects: Some(vec![subject(values)]),
        };
        out.push(Manifest::from_resource(&role)?);
        out.push(Manifest::from_resource(&binding)?);
    }

    if let Some(grant) = &account.additional_cluster_role {
        let (role_name, binding_name) = match &grant.name {
            Some(name) => (name.clone(), name.clone()),
            None => (
                names::cluster_role_name(&values.service_id),
                names::cluster_role_binding_name(&values.service_id),
            ),
        };
        let role = ClusterRole {
            metadata: cluster_meta(role_name.clone(), labels.clone()),
            rules: Some(grant.rules.clone()),
            ..Default::default()
        };
        let binding = ClusterRoleBinding {
            metadata: cluster_meta(binding_name, labels.clone()),
            role_ref: role_ref("ClusterRole", role_name),
            subjects: Some(vec![subject(values)]),
        };
        out.push(Manifest::from_resource(&role)?);
        out.push(Manifest::from_resource(&binding)?);
    }

    Ok(out)
}

/// Metadata of a cluster-scoped object.
fn cluster_meta(name: String, labels: Labels) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        labels: non_empty_map(labels),
        ..Default::default()
    }
}

fn role_ref(kind: &str, name: String) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: kind.to_string(),
        name,
    }
}

fn subject(values: &DeploymentValues) -> Subject {
    Subject {
        kind: "ServiceAccount".to_string(),
        name: values.service_id.to_string(),
        namespace: Some(values.metadata.namespace.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    const RULES: &str = "
      rules:
        - apiGroups: ['']
          resources: [configmaps]
          verbs: [get, list]
";

    #[test]
    fn no_grants_do_not_apply() {
        assert!(!applies(&values("")));
        assert!(!applies(&values("serviceAccount:\n  annotations: {a: b}\n")));
    }

    #[test]
    fn namespaced_role_uses_default_names() {
        let values = values(&format!("serviceAccount:\n    additionalRole:{RULES}"));
        assert!(applies(&values));
        let out = generate(&values, &RenderConfig::default()).unwrap();
        assert_eq!(out.len(), 2);

        let role: Role = out[0].decode().unwrap();
        assert_eq!(role.metadata.name.as_deref(), Some("foo--bar--test--role"));
        assert_eq!(role.metadata.namespace.as_deref(), Some("apps"));
        assert_eq!(role.rules.unwrap()[0].verbs, ["get", "list"]);

        let binding: RoleBinding = out[1].decode().unwrap();
        assert_eq!(
            binding.metadata.name.as_deref(),
            Some("foo--bar--test--role-binding")
        );
        assert_eq!(binding.role_ref.kind, "Role");
        assert_eq!(binding.role_ref.name, "foo--bar--test--role");
        assert_eq!(binding.role_ref.api_group, "rbac.authorization.k8s.io");
        let subject = &binding.subjects.unwrap()[0];
        assert_eq!(subject.kind, "ServiceAccount");
        assert_eq!(subject.name, "foo--bar--test");
        assert_eq!(subject.namespace.as_deref(), Some("apps"));
    }

    #[test]
    fn explicit_name_is_shared() {
        let values = values(&format!(
            "serviceAccount:\n    additionalClusterRole:\n      name: reader{RULES}"
        ));
        let out = generate(&values, &RenderConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind(), Some("ClusterRole"));
        assert_eq!(out[0].name(), Some("reader"));
        assert_eq!(out[0].namespace(), None);
        assert_eq!(out[1].kind(), Some("ClusterRoleBinding"));
        assert_eq!(out[1].name(), Some("reader"));

        let binding: ClusterRoleBinding = out[1].decode().unwrap();
        assert_eq!(binding.role_ref.kind, "ClusterRole");
        assert_eq!(binding.role_ref.name, "reader");
    }
}
