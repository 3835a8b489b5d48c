//! Chain read collaborator.
//!
//! The node only reads from the RRP contract here; transaction submission is
//! handled elsewhere. Implementations wrap a contract binding for the RRP
//! contract on one chain.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;

/// Parameters shared by every authorization check of one run.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationTarget<'a> {
    /// RRP contract the checks are made against.
    pub airnode_rrp: Address,
    pub authorizers: &'a [Address],
    pub airnode_address: Address,
}

/// Per-request inputs to an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationQuery {
    pub request_id: B256,
    pub endpoint_id: B256,
    pub sponsor_address: Address,
    pub requester_address: Address,
}

/// Read-only access to the RRP contract's authorization checks.
#[async_trait]
pub trait AuthorizationReader: Send + Sync {
    /// Checks whether a single request is authorized.
    async fn check_authorization_status(
        &self,
        target: &AuthorizationTarget<'_>,
        query: &AuthorizationQuery,
    ) -> anyhow::Result<bool>;

    /// Checks many requests in one call. The returned statuses must be in the
    /// same order as `queries`, one per query.
    async fn check_authorization_statuses(
        &self,
        target: &AuthorizationTarget<'_>,
        queries: &[AuthorizationQuery],
    ) -> anyhow::Result<Vec<bool>>;
}
