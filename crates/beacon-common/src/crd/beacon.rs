//! Beacon Custom Resource Definition
//!
//! A Beacon represents one managed ingress proxy fleet and describes how its
//! network endpoints are published: through a cloud load balancer, on a
//! static port of every node, or cluster-internally only.
//!
//! The publishing configuration is a discriminated union. Parameters only
//! meaningful for one strategy live inside that strategy's variant, so a
//! NodePort Beacon carrying stale load balancer parameters is
//! unrepresentable rather than merely ignored.

use std::collections::HashSet;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reserved name of the proxy's insecure listener port
pub const HTTP_PORT_NAME: &str = "http";

/// Reserved name of the proxy's secure listener port
pub const HTTPS_PORT_NAME: &str = "https";

/// Default container port behind the insecure listener
pub const DEFAULT_HTTP_TARGET_PORT: u16 = 8080;

/// Default container port behind the secure listener
pub const DEFAULT_HTTPS_TARGET_PORT: u16 = 8443;

/// Beacon defines a managed ingress proxy fleet and how it is published
/// to the network.
///
/// Example:
/// ```yaml
/// apiVersion: beacon.dev/v1alpha1
/// kind: Beacon
/// metadata:
///   name: edge
/// spec:
///   networkPublishing:
///     proxy:
///       strategy:
///         type: LoadBalancer
///         loadBalancer:
///           scope: Internal
///           providerParameters:
///             type: AWS
///             aws:
///               type: NLB
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "beacon.dev",
    version = "v1alpha1",
    kind = "Beacon",
    namespaced,
    printcolumn = r#"{"name":"Strategy","type":"string","jsonPath":".spec.networkPublishing.proxy.strategy.type"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BeaconSpec {
    /// How Beacon's components are published to the network
    #[serde(default)]
    pub network_publishing: NetworkPublishing,
}

impl BeaconSpec {
    /// Validate the Beacon specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.network_publishing.proxy.validate()
    }
}

/// Schema for publishing Beacon's components to a network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPublishing {
    /// Publishing configuration for the data-plane proxy's endpoints
    #[serde(default)]
    pub proxy: ProxyPublishing,
}

/// Publishing configuration for the data-plane proxy
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyPublishing {
    /// Strategy used to expose the proxy's listeners
    #[serde(default)]
    pub strategy: PublishingStrategy,

    /// Container ports exposed by the proxy.
    ///
    /// Exactly two ports must be listed, one named "http" for the insecure
    /// listener and one named "https" for the secure listener. Names and
    /// port numbers must be unique within the list.
    #[serde(default = "default_container_ports")]
    pub container_ports: Vec<ContainerPortSpec>,
}

impl Default for ProxyPublishing {
    fn default() -> Self {
        Self {
            strategy: PublishingStrategy::default(),
            container_ports: default_container_ports(),
        }
    }
}

fn default_container_ports() -> Vec<ContainerPortSpec> {
    vec![
        ContainerPortSpec {
            name: HTTP_PORT_NAME.to_string(),
            port_number: DEFAULT_HTTP_TARGET_PORT,
        },
        ContainerPortSpec {
            name: HTTPS_PORT_NAME.to_string(),
            port_number: DEFAULT_HTTPS_TARGET_PORT,
        },
    ]
}

impl ProxyPublishing {
    /// Look up a container port by name
    pub fn container_port(&self, name: &str) -> Option<&ContainerPortSpec> {
        self.container_ports.iter().find(|p| p.name == name)
    }

    /// Validate the publishing configuration
    ///
    /// The API server enforces most of this through the CRD schema; the
    /// checks are repeated here so a bad object reaching the compiler is
    /// reported instead of silently defaulted.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.container_ports.len() != 2 {
            return Err(crate::Error::validation(format!(
                "exactly two container ports required, found {}",
                self.container_ports.len()
            )));
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut numbers: HashSet<u16> = HashSet::new();
        for port in &self.container_ports {
            if port.port_number == 0 {
                return Err(crate::Error::validation(format!(
                    "container port '{}': port number cannot be 0",
                    port.name
                )));
            }
            if !names.insert(port.name.as_str()) {
                return Err(crate::Error::validation(format!(
                    "duplicate container port name '{}'",
                    port.name
                )));
            }
            if !numbers.insert(port.port_number) {
                return Err(crate::Error::validation(format!(
                    "duplicate container port number {}",
                    port.port_number
                )));
            }
        }

        for required in [HTTP_PORT_NAME, HTTPS_PORT_NAME] {
            if self.container_port(required).is_none() {
                return Err(crate::Error::validation(format!(
                    "container port '{required}' is required but missing"
                )));
            }
        }

        if let PublishingStrategy::NodePort {
            node_ports: Some(node_ports),
        } = &self.strategy
        {
            validate_node_ports(node_ports)?;
        }

        Ok(())
    }
}

fn validate_node_ports(node_ports: &[NodePortSpec]) -> Result<(), crate::Error> {
    if node_ports.len() != 2 {
        return Err(crate::Error::validation(format!(
            "exactly two node ports required when the list is supplied, found {}",
            node_ports.len()
        )));
    }

    let mut numbers: HashSet<u16> = HashSet::new();
    for required in [HTTP_PORT_NAME, HTTPS_PORT_NAME] {
        if !node_ports.iter().any(|np| np.name == required) {
            return Err(crate::Error::validation(format!(
                "node port '{required}' is required but missing"
            )));
        }
    }
    for node_port in node_ports {
        if let Some(number) = node_port.port_number {
            if number == 0 {
                return Err(crate::Error::validation(format!(
                    "node port '{}': port number cannot be 0",
                    node_port.name
                )));
            }
            if !numbers.insert(number) {
                return Err(crate::Error::validation(format!(
                    "duplicate node port number {number}"
                )));
            }
        }
    }

    Ok(())
}

/// How the proxy's listeners are exposed on the network
///
/// The variants form a union discriminated by `type`: each strategy carries
/// only the parameters that are meaningful for it.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(tag = "type")]
pub enum PublishingStrategy {
    /// Publish through a cloud provider load balancer.
    ///
    /// The Service publishes the insecure listener on port 80 and the
    /// secure listener on port 443.
    #[serde(rename_all = "camelCase")]
    LoadBalancer {
        /// Parameters for the load balancer
        #[serde(default)]
        load_balancer: LoadBalancerStrategy,
    },

    /// Publish on a static port of every node's address.
    #[serde(rename_all = "camelCase")]
    NodePort {
        /// Static node ports, one named "http" and one named "https".
        ///
        /// When unset, both port numbers are assigned by the API server
        /// from the cluster's node-port range.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_ports: Option<Vec<NodePortSpec>>,
    },

    /// Publish on a cluster-internal virtual address only.
    #[serde(rename = "ClusterIP")]
    ClusterIp,
}

impl Default for PublishingStrategy {
    fn default() -> Self {
        Self::LoadBalancer {
            load_balancer: LoadBalancerStrategy::default(),
        }
    }
}

/// Parameters for a load balancer
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerStrategy {
    /// Scope at which the load balancer is exposed
    #[serde(default)]
    pub scope: LoadBalancerScope,

    /// Load balancer parameters specific to the underlying infrastructure
    /// provider
    #[serde(default)]
    pub provider_parameters: ProviderParameters,
}

/// Scope at which a load balancer is exposed
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum LoadBalancerScope {
    /// Exposed on the cluster's public network, typically the Internet
    #[default]
    External,
    /// Exposed only on the cluster's private network
    Internal,
}

/// Load balancer parameters specific to the underlying infrastructure
/// provider
///
/// Discriminated by `type` so parameters for one provider cannot be
/// populated while another provider is selected.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(tag = "type")]
pub enum ProviderParameters {
    /// Amazon Web Services
    #[serde(rename = "AWS")]
    Aws {
        /// AWS-specific load balancer settings
        #[serde(default)]
        aws: AwsParameters,
    },
    /// Microsoft Azure
    Azure,
    /// Google Cloud Platform
    #[serde(rename = "GCP")]
    Gcp,
}

impl Default for ProviderParameters {
    fn default() -> Self {
        Self::Aws {
            aws: AwsParameters::default(),
        }
    }
}

/// AWS-specific load balancer settings
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsParameters {
    /// The kind of AWS load balancer to manage
    #[serde(rename = "type", default)]
    pub lb_type: AwsLoadBalancerType,
}

/// The kind of AWS load balancer to manage
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum AwsLoadBalancerType {
    /// Classic ELB: routing decisions at the transport or application layer
    #[default]
    Classic,
    /// Network load balancer: routing decisions at the transport layer
    #[serde(rename = "NLB")]
    Nlb,
}

/// A network port exposed from the proxy container
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPortSpec {
    /// IANA_SVC_NAME within the proxy pod, "http" or "https"
    pub name: String,
    /// Port number the listener binds inside the container
    pub port_number: u16,
}

/// A network port for the NodePort publishing strategy
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodePortSpec {
    /// IANA_SVC_NAME within the NodePort Service, "http" or "https"
    pub name: String,
    /// Static port number within the cluster's node-port range.
    ///
    /// When unset, the API server assigns one on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_number: Option<u16>,
}

// =============================================================================
// Tests
// =============================================================================
