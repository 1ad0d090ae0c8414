//! Listener port planning for published proxy Services
//!
//! Every publishing strategy exposes the same two listeners: "http" on
//! port 80 and "https" on port 443, forwarded to the container ports named
//! in the Beacon spec. Strategies differ only in whether the plan carries
//! static node ports.

use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::crd::{ProxyPublishing, PublishingStrategy, HTTPS_PORT_NAME, HTTP_PORT_NAME};
use crate::Error;

/// Network port the proxy's insecure listener is published on
pub const PROXY_HTTP_PORT: i32 = 80;

/// Network port the proxy's secure listener is published on
pub const PROXY_HTTPS_PORT: i32 = 443;

/// A single planned Service port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedPort {
    /// Port name, unique within the plan
    pub name: String,
    /// Port the Service listens on
    pub listen_port: i32,
    /// Static node port; unset entries are assigned by the API server and
    /// later adopted by the convergence engine
    pub node_port: Option<i32>,
    /// Container port traffic is forwarded to
    pub target_port: i32,
}

/// Ordered set of ports for a published proxy Service
///
/// Protocol is always TCP; the proxy's listeners do not speak UDP or SCTP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortPlan {
    ports: Vec<PlannedPort>,
}

impl PortPlan {
    /// Build the port plan for a publishing configuration.
    ///
    /// Listen ports are fixed regardless of the container target ports:
    /// "http" publishes on 80 and "https" on 443. Static node ports are
    /// carried only for the NodePort strategy and only where the spec names
    /// them explicitly.
    ///
    /// A missing canonical container port means the object bypassed schema
    /// validation; it is reported as a validation error rather than
    /// defaulted here.
    pub fn build(publishing: &ProxyPublishing) -> Result<Self, Error> {
        let listeners = [
            (HTTP_PORT_NAME, PROXY_HTTP_PORT),
            (HTTPS_PORT_NAME, PROXY_HTTPS_PORT),
        ];

        let mut ports = Vec::with_capacity(listeners.len());
        for (name, listen_port) in listeners {
            let target = publishing.container_port(name).ok_or_else(|| {
                Error::validation(format!("container port '{name}' is required but missing"))
            })?;
            ports.push(PlannedPort {
                name: name.to_string(),
                listen_port,
                node_port: explicit_node_port(&publishing.strategy, name),
                target_port: i32::from(target.port_number),
            });
        }

        Ok(Self { ports })
    }

    /// The planned ports, in publish order
    pub fn ports(&self) -> &[PlannedPort] {
        &self.ports
    }

    /// Render the plan as Kubernetes ServicePorts
    pub fn to_service_ports(&self) -> Vec<ServicePort> {
        self.ports
            .iter()
            .map(|p| ServicePort {
                name: Some(p.name.clone()),
                port: p.listen_port,
                node_port: p.node_port,
                target_port: Some(IntOrString::Int(p.target_port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            })
            .collect()
    }
}

/// Static node port for a named listener, when the strategy carries one
fn explicit_node_port(strategy: &PublishingStrategy, name: &str) -> Option<i32> {
    match strategy {
        PublishingStrategy::NodePort {
            node_ports: Some(node_ports),
        } => node_ports
            .iter()
            .find(|np| np.name == name)
            .and_then(|np| np.port_number)
            .map(i32::from),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
