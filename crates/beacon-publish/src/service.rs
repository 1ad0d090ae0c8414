//! Desired Service synthesis for a published Beacon
//!
//! Compiles a Beacon's publishing configuration into the Kubernetes
//! Services that expose it:
//!
//! - the data-plane proxy Service, shaped by the publishing strategy
//! - the cluster-internal xDS discovery Service the proxy fleet uses to
//!   reach the control plane

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use beacon_common::{OWNING_BEACON_NAME_LABEL, OWNING_BEACON_NS_LABEL};

use crate::annotations::provider_annotations;
use crate::crd::{ProxyPublishing, PublishingStrategy};
use crate::ports::PortPlan;
use crate::Error;

/// Port the control plane serves xDS configuration on
pub const XDS_PORT: i32 = 8001;

/// Name of the xDS port within the discovery Service
pub const XDS_PORT_NAME: &str = "xds";

/// Compiler for the Kubernetes Services that publish a Beacon
pub struct ServiceCompiler;

impl ServiceCompiler {
    /// Compile the data-plane proxy Service.
    ///
    /// The Service type follows the publishing strategy, ports come from
    /// the [`PortPlan`], and annotations from the provider policy. External
    /// traffic policy is Local for every externally reachable type so the
    /// proxy sees client source addresses.
    pub fn compile(
        name: &str,
        namespace: &str,
        publishing: &ProxyPublishing,
    ) -> Result<Service, Error> {
        let plan = PortPlan::build(publishing)?;
        let annotations = provider_annotations(&publishing.strategy);

        Ok(Service {
            metadata: ObjectMeta {
                name: Some(format!("{name}-proxy")),
                namespace: Some(namespace.to_string()),
                labels: Some(resource_labels(name, namespace, proxy_selector(name))),
                annotations: (!annotations.is_empty()).then_some(annotations),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(service_type(&publishing.strategy).to_string()),
                external_traffic_policy: external_traffic_policy(&publishing.strategy)
                    .map(str::to_string),
                selector: Some(proxy_selector(name)),
                ports: Some(plan.to_service_ports()),
                ..Default::default()
            }),
            status: None,
        })
    }

    /// Compile the cluster-internal xDS discovery Service.
    ///
    /// Always ClusterIP: the proxy fleet reaches the control plane over the
    /// cluster network regardless of how the proxy itself is published.
    pub fn compile_xds(name: &str, namespace: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(format!("{name}-xds")),
                namespace: Some(namespace.to_string()),
                labels: Some(resource_labels(name, namespace, control_plane_selector(name))),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                selector: Some(control_plane_selector(name)),
                ports: Some(vec![ServicePort {
                    name: Some(XDS_PORT_NAME.to_string()),
                    port: XDS_PORT,
                    target_port: Some(IntOrString::Int(XDS_PORT)),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Kubernetes Service type for a publishing strategy
fn service_type(strategy: &PublishingStrategy) -> &'static str {
    match strategy {
        PublishingStrategy::LoadBalancer { .. } => "LoadBalancer",
        PublishingStrategy::NodePort { .. } => "NodePort",
        PublishingStrategy::ClusterIp => "ClusterIP",
    }
}

/// External traffic policy for a publishing strategy.
///
/// A ClusterIP Service cannot carry one; the API server rejects it.
fn external_traffic_policy(strategy: &PublishingStrategy) -> Option<&'static str> {
    match strategy {
        PublishingStrategy::ClusterIp => None,
        PublishingStrategy::LoadBalancer { .. } | PublishingStrategy::NodePort { .. } => {
            Some("Local")
        }
    }
}

/// Selector matching the data-plane proxy pods of a Beacon
fn proxy_selector(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "app.kubernetes.io/name".to_string(),
            "beacon-proxy".to_string(),
        ),
        ("app.kubernetes.io/instance".to_string(), name.to_string()),
    ])
}

/// Selector matching the control-plane pods of a Beacon
fn control_plane_selector(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app.kubernetes.io/name".to_string(), "beacon".to_string()),
        ("app.kubernetes.io/instance".to_string(), name.to_string()),
    ])
}

/// Metadata labels for a generated Service: the component selector plus
/// management and ownership labels
fn resource_labels(
    name: &str,
    namespace: &str,
    selector: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut labels = selector;
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "beacon".to_string(),
    );
    labels.insert(OWNING_BEACON_NAME_LABEL.to_string(), name.to_string());
    labels.insert(OWNING_BEACON_NS_LABEL.to_string(), namespace.to_string());
    labels
}

// =============================================================================
// Tests
// =============================================================================
