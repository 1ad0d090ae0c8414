//! Provider-specific load balancer annotations
//!
//! Each cloud provider reads its own Service annotations to shape the load
//! balancer it provisions. The policy here is a pure function of the
//! (provider, sub-type, scope) tuple, dispatched in a single exhaustive
//! match: rows are provider-exclusive and never combined, so the set for
//! one provider cannot contain another provider's keys.

use std::collections::BTreeMap;

use crate::crd::{AwsLoadBalancerType, LoadBalancerScope, ProviderParameters, PublishingStrategy};

/// AWS: protocol spoken between a Classic ELB and the proxy
pub const AWS_LB_BACKEND_PROTO_ANNOTATION: &str =
    "service.beta.kubernetes.io/aws-load-balancer-backend-protocol";

/// AWS: enable PROXY protocol on a Classic ELB
pub const AWS_LB_PROXY_PROTOCOL_ANNOTATION: &str =
    "service.beta.kubernetes.io/aws-load-balancer-proxy-protocol";

/// AWS: provision an NLB instead of a Classic ELB
pub const AWS_LB_TYPE_ANNOTATION: &str = "service.beta.kubernetes.io/aws-load-balancer-type";

/// AWS: restrict the load balancer to the cluster's private network
pub const AWS_INTERNAL_LB_ANNOTATION: &str =
    "service.beta.kubernetes.io/aws-load-balancer-internal";

/// Azure: restrict the load balancer to the cluster's private network
pub const AZURE_INTERNAL_LB_ANNOTATION: &str =
    "service.beta.kubernetes.io/azure-load-balancer-internal";

/// GCP: load balancer type marker
pub const GCP_LB_TYPE_ANNOTATION: &str = "cloud.google.com/load-balancer-type";

/// Annotation keys this policy owns on a published Service.
///
/// The convergence engine replaces values for these keys wholesale on every
/// pass and never touches keys outside this list.
pub const OWNED_ANNOTATIONS: [&str; 6] = [
    AWS_LB_BACKEND_PROTO_ANNOTATION,
    AWS_LB_PROXY_PROTOCOL_ANNOTATION,
    AWS_LB_TYPE_ANNOTATION,
    AWS_INTERNAL_LB_ANNOTATION,
    AZURE_INTERNAL_LB_ANNOTATION,
    GCP_LB_TYPE_ANNOTATION,
];

/// Compute the provider annotations for a publishing strategy.
///
/// Only the LoadBalancer strategy carries annotations; every other strategy
/// yields the empty set. The set is recomputed from scratch on every pass:
/// no key from a prior provider or sub-type survives a change.
pub fn provider_annotations(strategy: &PublishingStrategy) -> BTreeMap<String, String> {
    let PublishingStrategy::LoadBalancer { load_balancer } = strategy else {
        return BTreeMap::new();
    };

    let pairs: &[(&str, &str)] =
        match (&load_balancer.provider_parameters, load_balancer.scope) {
            (ProviderParameters::Aws { aws }, scope) => match (aws.lb_type, scope) {
                (AwsLoadBalancerType::Classic, LoadBalancerScope::External) => &[
                    (AWS_LB_BACKEND_PROTO_ANNOTATION, "tcp"),
                    (AWS_LB_PROXY_PROTOCOL_ANNOTATION, "*"),
                ],
                (AwsLoadBalancerType::Classic, LoadBalancerScope::Internal) => &[
                    (AWS_LB_BACKEND_PROTO_ANNOTATION, "tcp"),
                    (AWS_LB_PROXY_PROTOCOL_ANNOTATION, "*"),
                    // Required to use the proper private subnet.
                    (AWS_INTERNAL_LB_ANNOTATION, "0.0.0.0/0"),
                ],
                (AwsLoadBalancerType::Nlb, LoadBalancerScope::External) => {
                    &[(AWS_LB_TYPE_ANNOTATION, "nlb")]
                }
                (AwsLoadBalancerType::Nlb, LoadBalancerScope::Internal) => &[
                    (AWS_LB_TYPE_ANNOTATION, "nlb"),
                    (AWS_INTERNAL_LB_ANNOTATION, "0.0.0.0/0"),
                ],
            },
            (ProviderParameters::Azure, LoadBalancerScope::Internal) => {
                &[(AZURE_INTERNAL_LB_ANNOTATION, "true")]
            }
            (ProviderParameters::Azure, LoadBalancerScope::External) => &[],
            (ProviderParameters::Gcp, _) => &[(GCP_LB_TYPE_ANNOTATION, "Internal")],
        };

    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AwsParameters, LoadBalancerStrategy};

    fn make_strategy(
        scope: LoadBalancerScope,
        provider_parameters: ProviderParameters,
    ) -> PublishingStrategy {
        PublishingStrategy::LoadBalancer {
            load_balancer: LoadBalancerStrategy {
                scope,
                provider_parameters,
            },
        }
    }

    fn aws(lb_type: AwsLoadBalancerType) -> ProviderParameters {
        ProviderParameters::Aws {
            aws: AwsParameters { lb_type },
        }
    }

    // =========================================================================
    // Story: Decision Table Rows
    // =========================================================================

    /// Story: External AWS Classic gets backend protocol and PROXY protocol
    #[test]
    fn story_aws_classic_external() {
        let annotations = provider_annotations(&make_strategy(
            LoadBalancerScope::External,
            aws(AwsLoadBalancerType::Classic),
        ));

        assert_eq!(annotations.len(), 2);
        assert_eq!(
            annotations.get(AWS_LB_BACKEND_PROTO_ANNOTATION).map(String::as_str),
            Some("tcp")
        );
        assert_eq!(
            annotations.get(AWS_LB_PROXY_PROTOCOL_ANNOTATION).map(String::as_str),
            Some("*")
        );
    }

    /// Story: Internal AWS Classic additionally gets the internal marker
    #[test]
    fn story_aws_classic_internal() {
        let annotations = provider_annotations(&make_strategy(
            LoadBalancerScope::Internal,
            aws(AwsLoadBalancerType::Classic),
        ));

        assert_eq!(annotations.len(), 3);
        assert_eq!(
            annotations.get(AWS_INTERNAL_LB_ANNOTATION).map(String::as_str),
            Some("0.0.0.0/0")
        );
        assert!(annotations.contains_key(AWS_LB_PROXY_PROTOCOL_ANNOTATION));
    }

    /// Story: An NLB gets only the load balancer type annotation
    #[test]
    fn story_aws_nlb_external() {
        let annotations = provider_annotations(&make_strategy(
            LoadBalancerScope::External,
            aws(AwsLoadBalancerType::Nlb),
        ));

        assert_eq!(annotations.len(), 1);
        assert_eq!(
            annotations.get(AWS_LB_TYPE_ANNOTATION).map(String::as_str),
            Some("nlb")
        );
        assert!(!annotations.contains_key(AWS_LB_BACKEND_PROTO_ANNOTATION));
        assert!(!annotations.contains_key(AWS_LB_PROXY_PROTOCOL_ANNOTATION));
    }

    /// Story: An internal NLB gets the type annotation plus the internal
    /// marker
    #[test]
    fn story_aws_nlb_internal() {
        let annotations = provider_annotations(&make_strategy(
            LoadBalancerScope::Internal,
            aws(AwsLoadBalancerType::Nlb),
        ));

        assert_eq!(annotations.len(), 2);
        assert!(annotations.contains_key(AWS_LB_TYPE_ANNOTATION));
        assert!(annotations.contains_key(AWS_INTERNAL_LB_ANNOTATION));
    }

    /// Story: Azure only annotates internal load balancers
    #[test]
    fn story_azure_scopes() {
        let internal = provider_annotations(&make_strategy(
            LoadBalancerScope::Internal,
            ProviderParameters::Azure,
        ));
        assert_eq!(internal.len(), 1);
        assert_eq!(
            internal.get(AZURE_INTERNAL_LB_ANNOTATION).map(String::as_str),
            Some("true")
        );

        let external = provider_annotations(&make_strategy(
            LoadBalancerScope::External,
            ProviderParameters::Azure,
        ));
        assert!(external.is_empty());
    }

    /// Story: GCP gets its type marker at either scope
    #[test]
    fn story_gcp_any_scope() {
        for scope in [LoadBalancerScope::Internal, LoadBalancerScope::External] {
            let annotations =
                provider_annotations(&make_strategy(scope, ProviderParameters::Gcp));
            assert_eq!(annotations.len(), 1);
            assert!(annotations.contains_key(GCP_LB_TYPE_ANNOTATION));
        }
    }

    /// Story: Non-load-balancer strategies carry no annotations
    #[test]
    fn story_other_strategies_empty() {
        assert!(provider_annotations(&PublishingStrategy::ClusterIp).is_empty());
        assert!(
            provider_annotations(&PublishingStrategy::NodePort { node_ports: None }).is_empty()
        );
    }

    // =========================================================================
    // Story: No Cross-Provider Leakage
    // =========================================================================

    /// Story: No provider's set ever contains a key belonging to another
    /// provider
    #[test]
    fn story_no_cross_provider_leakage() {
        let aws_keys = [
            AWS_LB_BACKEND_PROTO_ANNOTATION,
            AWS_LB_PROXY_PROTOCOL_ANNOTATION,
            AWS_LB_TYPE_ANNOTATION,
            AWS_INTERNAL_LB_ANNOTATION,
        ];
        let azure_keys = [AZURE_INTERNAL_LB_ANNOTATION];
        let gcp_keys = [GCP_LB_TYPE_ANNOTATION];

        let providers: Vec<(ProviderParameters, &[&str])> = vec![
            (aws(AwsLoadBalancerType::Classic), &aws_keys),
            (aws(AwsLoadBalancerType::Nlb), &aws_keys),
            (ProviderParameters::Azure, &azure_keys),
            (ProviderParameters::Gcp, &gcp_keys),
        ];

        for (params, own_keys) in &providers {
            for scope in [LoadBalancerScope::External, LoadBalancerScope::Internal] {
                let annotations =
                    provider_annotations(&make_strategy(scope, params.clone()));
                for key in annotations.keys() {
                    assert!(
                        own_keys.contains(&key.as_str()),
                        "{params:?}/{scope:?} emitted foreign key {key}"
                    );
                }
            }
        }
    }

    /// Story: Every key any row can emit is in the owned allow-list
    #[test]
    fn story_all_emitted_keys_are_owned() {
        let sub_types = [
            aws(AwsLoadBalancerType::Classic),
            aws(AwsLoadBalancerType::Nlb),
            ProviderParameters::Azure,
            ProviderParameters::Gcp,
        ];

        for params in sub_types {
            for scope in [LoadBalancerScope::External, LoadBalancerScope::Internal] {
                let annotations =
                    provider_annotations(&make_strategy(scope, params.clone()));
                for key in annotations.keys() {
                    assert!(
                        OWNED_ANNOTATIONS.contains(&key.as_str()),
                        "emitted key {key} missing from OWNED_ANNOTATIONS"
                    );
                }
            }
        }
    }
}
