//! Custom Resource Definitions for Beacon
//!
//! This module contains all CRD definitions used by the Beacon operator.

mod beacon;

pub use beacon::{
    AwsLoadBalancerType, AwsParameters, Beacon, BeaconSpec, ContainerPortSpec,
    LoadBalancerScope, LoadBalancerStrategy, NetworkPublishing, NodePortSpec,
    ProviderParameters, ProxyPublishing, PublishingStrategy, DEFAULT_HTTPS_TARGET_PORT,
    DEFAULT_HTTP_TARGET_PORT, HTTPS_PORT_NAME, HTTP_PORT_NAME,
};
