//! Authorization resolution.
//!
//! Pending requests are checked against the chain's authorizer contracts in
//! fixed-size batches that run concurrently. A batch that cannot be read
//! falls back to one call per request. A request whose status cannot be
//! read either way is left out of the result map: absence means "unknown",
//! never "unauthorized".

use std::collections::BTreeMap;

use alloy_primitives::Address;
use futures_util::future::join_all;
use rrp_core::{AuthorizationByRequestId, LogEntry, LogsAndValue, Request};

use crate::chain::{AuthorizationQuery, AuthorizationReader, AuthorizationTarget};
use crate::retry::{go, RetryOptions};

/// Inputs shared by every authorization read of one run.
#[derive(Clone, Copy)]
pub struct FetchOptions<'a> {
    /// Authorizer contracts. Empty means the endpoint is public.
    pub authorizers: &'a [Address],
    pub airnode_address: Address,
    pub airnode_rrp_address: Address,
    /// Contract handle reused for every read of the run.
    pub reader: &'a dyn AuthorizationReader,
    pub batch_size: usize,
    pub retry: RetryOptions,
}

/// Resolves the authorization status of every pending request in `requests`.
pub async fn fetch(
    requests: &[Request],
    options: &FetchOptions<'_>,
) -> LogsAndValue<AuthorizationByRequestId> {
    let pending: Vec<&Request> = requests.iter().filter(|r| r.is_pending()).collect();

    // Nothing to check, so no chain call either.
    if pending.is_empty() {
        return LogsAndValue::silent(BTreeMap::new());
    }

    if options.authorizers.is_empty() {
        return LogsAndValue::silent(pending.iter().map(|r| (r.id, true)).collect());
    }

    let mut logs = Vec::new();
    let mut queries = Vec::with_capacity(pending.len());
    for request in pending {
        match request.endpoint_id() {
            Some(endpoint_id) => queries.push(AuthorizationQuery {
                request_id: request.id,
                endpoint_id,
                sponsor_address: request.sponsor_address,
                requester_address: request.requester_address,
            }),
            None => logs.push(LogEntry::error(format!(
                "Unable to fetch authorization details for Request:{} as its endpoint ID is unknown",
                request.id
            ))),
        }
    }

    let target = AuthorizationTarget {
        airnode_rrp: options.airnode_rrp_address,
        authorizers: options.authorizers,
        airnode_address: options.airnode_address,
    };

    // join_all yields results in submission order, whatever order the
    // batches complete in.
    let responses = join_all(
        queries
            .chunks(options.batch_size.max(1))
            .map(|batch| fetch_authorization_statuses(options.reader, &target, batch, options.retry)),
    )
    .await;

    let mut authorizations = BTreeMap::new();
    for response in responses {
        logs.extend(response.logs);
        authorizations.extend(response.value);
    }
    LogsAndValue::new(logs, authorizations)
}

/// Reads one batch, falling back to per-request reads if the batch fails.
async fn fetch_authorization_statuses(
    reader: &dyn AuthorizationReader,
    target: &AuthorizationTarget<'_>,
    batch: &[AuthorizationQuery],
    retry: RetryOptions,
) -> LogsAndValue<AuthorizationByRequestId> {
    let result = go(
        move || reader.check_authorization_statuses(target, batch),
        retry,
    )
    .await;

    let group_log = match result {
        // Statuses come back in request order, so zipping is safe only when
        // the lengths agree.
        Ok(statuses) if statuses.len() == batch.len() => {
            let authorizations = batch
                .iter()
                .zip(statuses)
                .map(|(query, authorized)| (query.request_id, authorized))
                .collect();
            return LogsAndValue::silent(authorizations);
        }
        Ok(statuses) => LogEntry::error(format!(
            "Failed to fetch group authorization details: received {} statuses for {} requests",
            statuses.len(),
            batch.len()
        )),
        Err(err) => LogEntry::error("Failed to fetch group authorization details").with_error(err),
    };

    let fallbacks = join_all(
        batch
            .iter()
            .map(|query| fetch_authorization_status(reader, target, query, retry)),
    )
    .await;

    let mut logs = vec![group_log];
    let mut authorizations = BTreeMap::new();
    for (query, fallback) in batch.iter().zip(fallbacks) {
        logs.extend(fallback.logs);
        if let Some(authorized) = fallback.value {
            authorizations.insert(query.request_id, authorized);
        }
    }
    LogsAndValue::new(logs, authorizations)
}

/// Reads the authorization status of a single request.
pub async fn fetch_authorization_status(
    reader: &dyn AuthorizationReader,
    target: &AuthorizationTarget<'_>,
    query: &AuthorizationQuery,
    retry: RetryOptions,
) -> LogsAndValue<Option<bool>> {
    match go(move || reader.check_authorization_status(target, query), retry).await {
        Ok(authorized) => LogsAndValue::new(
            vec![LogEntry::info(format!(
                "Fetched authorization status for Request:{}",
                query.request_id
            ))],
            Some(authorized),
        ),
        Err(err) => LogsAndValue::new(
            vec![LogEntry::error(format!(
                "Failed to fetch authorization details for Request:{}",
                query.request_id
            ))
            .with_error(err)],
            None,
        ),
    }
}
