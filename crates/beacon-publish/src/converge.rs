//! Convergence of live Services toward their desired definition
//!
//! This is the decision half of the controller pattern: observe current
//! state, determine desired state, calculate diff, apply changes. The
//! surrounding reconciler performs the read and the write; this module is a
//! pure function between the observed Service and the compiled desired
//! Service.
//!
//! Ownership is an explicit allow-list. The engine owns the Service type,
//! the port list, the external traffic policy, and the annotation keys in
//! [`OWNED_ANNOTATIONS`]. Everything else on the live object is preserved
//! verbatim: the cluster-assigned address, API-server-assigned node ports,
//! resource identity, and annotations set by other actors.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use tracing::debug;

use crate::annotations::OWNED_ANNOTATIONS;

/// Outcome of a convergence pass
#[derive(Clone, Debug, PartialEq)]
pub enum Convergence {
    /// Every owned field already matches the desired state
    Unchanged,
    /// The live Service drifted or does not exist; apply this replacement
    Replace(Box<Service>),
}

impl Convergence {
    /// The replacement Service, if one is required
    pub fn into_service(self) -> Option<Service> {
        match self {
            Self::Unchanged => None,
            Self::Replace(service) => Some(*service),
        }
    }
}

/// Converge a live Service toward the desired definition.
///
/// With no live Service the desired definition is applied as-is. Otherwise
/// an update candidate is built from the desired definition plus the live
/// object's externally-owned fields, and the owned fields are compared for
/// drift. Repeated passes over an already-converged Service return
/// [`Convergence::Unchanged`].
pub fn converge(desired: &Service, existing: Option<&Service>) -> Convergence {
    let name = desired.metadata.name.as_deref().unwrap_or_default();

    let Some(existing) = existing else {
        debug!(service = %name, "no live service, creating");
        return Convergence::Replace(Box::new(desired.clone()));
    };

    let candidate = merge(desired, existing);
    if owned_fields_differ(name, &candidate, existing) {
        Convergence::Replace(Box::new(candidate))
    } else {
        Convergence::Unchanged
    }
}

/// Build the update candidate: the desired definition plus every
/// externally-owned field carried over from the live object.
fn merge(desired: &Service, existing: &Service) -> Service {
    let mut candidate = desired.clone();

    // Resource identity belongs to the API server.
    candidate.metadata.resource_version = existing.metadata.resource_version.clone();
    candidate.metadata.uid = existing.metadata.uid.clone();

    if let (Some(spec), Some(existing_spec)) = (candidate.spec.as_mut(), existing.spec.as_ref()) {
        // The cluster address is assigned once and immutable.
        spec.cluster_ip = existing_spec.cluster_ip.clone();
        spec.cluster_ips = existing_spec.cluster_ips.clone();

        // Adopt node ports the API server assigned where the plan left them
        // unset. A ClusterIP candidate never adopts: the type cannot carry
        // node ports, and a strategy switch must shed them.
        if spec.type_.as_deref() != Some("ClusterIP") {
            if let (Some(ports), Some(existing_ports)) =
                (spec.ports.as_mut(), existing_spec.ports.as_ref())
            {
                for port in ports.iter_mut().filter(|p| p.node_port.is_none()) {
                    port.node_port = existing_ports
                        .iter()
                        .find(|existing_port| existing_port.name == port.name)
                        .and_then(|existing_port| existing_port.node_port);
                }
            }
        }
    }

    // Annotations outside the owned set belong to other actors and are kept
    // as-is. The owned subset is replaced wholesale with the freshly
    // computed values.
    let mut annotations: BTreeMap<String, String> =
        existing.metadata.annotations.clone().unwrap_or_default();
    annotations.retain(|key, _| !OWNED_ANNOTATIONS.contains(&key.as_str()));
    annotations.extend(desired.metadata.annotations.clone().unwrap_or_default());
    candidate.metadata.annotations = (!annotations.is_empty()).then_some(annotations);

    candidate
}

/// Compare the candidate against the live object over owned fields only
fn owned_fields_differ(name: &str, candidate: &Service, existing: &Service) -> bool {
    let cand = candidate.spec.as_ref();
    let live = existing.spec.as_ref();

    if cand.and_then(|s| s.type_.as_ref()) != live.and_then(|s| s.type_.as_ref()) {
        debug!(service = %name, "service type drifted");
        return true;
    }
    if cand.and_then(|s| s.external_traffic_policy.as_ref())
        != live.and_then(|s| s.external_traffic_policy.as_ref())
    {
        debug!(service = %name, "external traffic policy drifted");
        return true;
    }
    if cand.and_then(|s| s.ports.as_ref()) != live.and_then(|s| s.ports.as_ref()) {
        debug!(service = %name, "port list drifted");
        return true;
    }
    if owned_annotations(candidate) != owned_annotations(existing) {
        debug!(service = %name, "owned annotations drifted");
        return true;
    }

    false
}

/// The owned annotation subset of a Service
fn owned_annotations(service: &Service) -> BTreeMap<&str, &str> {
    service
        .metadata
        .annotations
        .iter()
        .flatten()
        .filter(|(key, _)| OWNED_ANNOTATIONS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
