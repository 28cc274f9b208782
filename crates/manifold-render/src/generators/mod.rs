//! The fixed, ordered set of resource generators.
//!
//! Each generator pairs a predicate with a factory. The pipeline evaluates
//! them in declaration order; generators never look at each other's output.

mod autoscaler;
mod config_maps;
mod cronjobs;
mod database;
mod disruption_budget;
mod entrypoint;
mod external_secrets;
mod extra_manifests;
mod monitors;
mod predeploy_job;
mod pvc;
mod rbac;
mod service;
mod service_account;
mod workload;

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use manifold_core::Labels;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

/// Decides whether a generator runs for a model.
pub type Predicate = fn(&DeploymentValues) -> bool;

/// Produces the objects of one resource category.
pub type Factory = fn(&DeploymentValues, &RenderConfig) -> Result<Vec<Manifest>>;

/// A named (predicate, factory) pair.
#[derive(Clone, Copy)]
pub struct Generator {
    /// Name used in logs and errors.
    pub name: &'static str,
    /// Whether the generator applies.
    pub applies: Predicate,
    /// Builds the objects.
    pub generate: Factory,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator").field("name", &self.name).finish()
    }
}

/// Every generator, in output order.
pub const GENERATORS: &[Generator] = &[
    Generator {
        name: "workload",
        applies: always,
        generate: workload::generate,
    },
    Generator {
        name: "service",
        applies: always,
        generate: service::generate,
    },
    Generator {
        name: "entrypoint",
        applies: entrypoint::applies,
        generate: entrypoint::generate,
    },
    Generator {
        name: "service-account",
        applies: always,
        generate: service_account::generate,
    },
    Generator {
        name: "persistent-volume-claims",
        applies: pvc::applies,
        generate: pvc::generate,
    },
    Generator {
        name: "pre-deployment-job",
        applies: predeploy_job::applies,
        generate: predeploy_job::generate,
    },
    Generator {
        name: "cronjobs",
        applies: cronjobs::applies,
        generate: cronjobs::generate,
    },
    Generator {
        name: "external-secrets",
        applies: external_secrets::applies,
        generate: external_secrets::generate,
    },
    Generator {
        name: "autoscaler",
        applies: autoscaler::applies,
        generate: autoscaler::generate,
    },
    Generator {
        name: "disruption-budget",
        applies: disruption_budget::applies,
        generate: disruption_budget::generate,
    },
    Generator {
        name: "database",
        applies: database::applies,
        generate: database::generate,
    },
    Generator {
        name: "rbac",
        applies: rbac::applies,
        generate: rbac::generate,
    },
    Generator {
        name: "config-maps",
        applies: config_maps::applies,
        generate: config_maps::generate,
    },
    Generator {
        name: "extra-manifests",
        applies: extra_manifests::applies,
        generate: extra_manifests::generate,
    },
    Generator {
        name: "monitors",
        applies: monitors::applies,
        generate: monitors::generate,
    },
];

/// Label key selecting workloads by service.
pub const APP_LABEL: &str = "app";

/// Label marking pods and services as scrape targets.
pub const SCRAPE_LABEL: &str = "prometheus-scrape";

fn always(_: &DeploymentValues) -> bool {
    true
}

/// Object metadata in the service namespace.
///
/// Empty label and annotation maps are left out.
pub(crate) fn object_meta(
    name: impl Into<String>,
    values: &DeploymentValues,
    labels: Labels,
    annotations: Labels,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(values.metadata.namespace.clone()),
        labels: non_empty_map(labels),
        annotations: non_empty_map(annotations),
        ..Default::default()
    }
}

/// Metadata of a pod template: labels and annotations only.
pub(crate) fn template_meta(labels: Labels, annotations: Labels) -> ObjectMeta {
    ObjectMeta {
        labels: non_empty_map(labels),
        annotations: non_empty_map(annotations),
        ..Default::default()
    }
}

pub(crate) fn non_empty_map<V>(map: BTreeMap<String, V>) -> Option<BTreeMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// `app=<name>`
pub(crate) fn app_labels(name: &str) -> Labels {
    Labels::from([(APP_LABEL.to_string(), name.to_string())])
}

/// `app=<name>, prometheus-scrape=true`
pub(crate) fn scrape_labels(name: &str) -> Labels {
    let mut labels = app_labels(name);
    labels.insert(SCRAPE_LABEL.to_string(), "true".to_string());
    labels
}

/// Selector matching `app=<name>`.
pub(crate) fn app_selector(name: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(app_labels(name)),
        ..Default::default()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_fixed() {
        let names: Vec<_> = GENERATORS.iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            [
                "workload",
                "service",
                "entrypoint",
                "service-account",
                "persistent-volume-claims",
                "pre-deployment-job",
                "cronjobs",
                "external-secrets",
                "autoscaler",
                "disruption-budget",
                "database",
                "rbac",
                "config-maps",
                "extra-manifests",
                "monitors",
            ]
        );
    }

    #[test]
    fn minimal_document_only_gets_the_basics() {
        let values = test_support::values("");
        let applied: Vec<_> = GENERATORS
            .iter()
            .filter(|g| (g.applies)(&values))
            .map(|g| g.name)
            .collect();
        assert_eq!(applied, ["workload", "service", "service-account"]);
    }

    #[test]
    fn scrape_labels_extend_app_labels() {
        let labels = scrape_labels("x");
        assert_eq!(labels["app"], "x");
        assert_eq!(labels["prometheus-scrape"], "true");
    }
}
