//! Derived resource names.
//!
//! Every function here is pure; the same inputs always give the same name.

use crate::metadata::ServiceId;

/// Maximum length of an object name.
pub const MAX_NAME_LEN: usize = 253;

/// Cut a name down to [`MAX_NAME_LEN`] characters and drop trailing dashes.
#[must_use]
pub fn truncate_name(name: &str) -> String {
    let cut = name
        .char_indices()
        .nth(MAX_NAME_LEN)
        .map_or(name.len(), |(idx, _)| idx);
    name[..cut].trim_end_matches('-').to_string()
}

/// Claim name for a newly provisioned persistent volume.
#[must_use]
pub fn pvc_name(id: &ServiceId, volume: &str) -> String {
    format!("{id}--{volume}")
}

/// Name of the secret projected from an external secret store path.
///
/// Slashes in the path become dashes; the result is truncated.
#[must_use]
pub fn external_secret_name(id: &ServiceId, store: &str, path: &str) -> String {
    let path = path.replace('/', "-");
    truncate_name(&format!("{id}--{store}--{path}"))
}

/// Name of the pre-deployment job.
#[must_use]
pub fn pre_deploy_job_name(id: &ServiceId) -> String {
    format!("{id}--pre-deploy")
}

/// Name of a scheduled job.
#[must_use]
pub fn cronjob_name(name: &str, environment: &str) -> String {
    format!("{name}--{environment}")
}

/// Name of the headless discovery service of a stateful workload.
#[must_use]
pub fn headless_service_name(id: &ServiceId) -> String {
    format!("{id}-headless")
}

/// Name of a generated config map.
#[must_use]
pub fn config_map_name(id: &ServiceId, name: &str) -> String {
    format!("{id}-{name}")
}

/// Default name of the namespaced role.
#[must_use]
pub fn role_name(id: &ServiceId) -> String {
    format!("{id}--role")
}

/// Default name of the namespaced role binding.
#[must_use]
pub fn role_binding_name(id: &ServiceId) -> String {
    format!("{id}--role-binding")
}

/// Default name of the cluster role.
#[must_use]
pub fn cluster_role_name(id: &ServiceId) -> String {
    format!("{id}--cluster-role")
}

/// Default name of the cluster role binding.
#[must_use]
pub fn cluster_role_binding_name(id: &ServiceId) -> String {
    format!("{id}--cluster-role-binding")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ServiceMetadata;
    use proptest::prelude::*;

    fn id() -> ServiceId {
        ServiceMetadata::new("ns", "foo", "bar", "test").service_id()
    }

    #[test]
    fn simple_names() {
        let id = id();
        assert_eq!(pvc_name(&id, "data"), "foo--bar--test--data");
        assert_eq!(pre_deploy_job_name(&id), "foo--bar--test--pre-deploy");
        assert_eq!(headless_service_name(&id), "foo--bar--test-headless");
        assert_eq!(config_map_name(&id, "cfg"), "foo--bar--test-cfg");
        assert_eq!(cronjob_name("nightly", "test"), "nightly--test");
        assert_eq!(role_name(&id), "foo--bar--test--role");
        assert_eq!(role_binding_name(&id), "foo--bar--test--role-binding");
        assert_eq!(cluster_role_name(&id), "foo--bar--test--cluster-role");
        assert_eq!(
            cluster_role_binding_name(&id),
            "foo--bar--test--cluster-role-binding"
        );
    }

    #[test]
    fn external_secret_name_replaces_slashes() {
        assert_eq!(
            external_secret_name(&id(), "vault", "team/app/db"),
            "foo--bar--test--vault--team-app-db"
        );
    }

    #[test]
    fn external_secret_name_is_truncated() {
        let path = "a".repeat(300);
        let name = external_secret_name(&id(), "vault", &path);
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert!(name.starts_with("foo--bar--test--vault--aaa"));
    }

    #[test]
    fn truncation_drops_trailing_dashes() {
        let name = format!("{}--tail", "x".repeat(MAX_NAME_LEN - 2));
        assert_eq!(truncate_name(&name), "x".repeat(MAX_NAME_LEN - 2));
    }

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(truncate_name("short"), "short");
    }

    proptest! {
        #[test]
        fn secret_names_stay_within_bounds(
            store in "[a-z]{1,20}",
            path in "[a-z/]{1,400}",
        ) {
            let name = external_secret_name(&id(), &store, &path);
            prop_assert!(name.len() <= MAX_NAME_LEN);
            prop_assert!(!name.ends_with('-'));
            prop_assert!(!name.contains('/'));
        }
    }
}
