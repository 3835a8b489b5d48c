//! Request id verification.
//!
//! Recomputes the id of every pending request from its on-chain fields and
//! ignores requests whose emitted id does not match. Also ignores requests
//! made on a chain other than the one being processed. Fully offline.

use alloy_primitives::U256;
use rrp_core::config::ChainConfig;
use rrp_core::request_id::derive_request_id;
use rrp_core::{ErrorKind, LogEntry, LogsAndValue, Request, RequestStatus};

/// Verifies every pending request's id. Output has the same length and
/// order as `requests`; non-pending requests pass through unchanged.
#[must_use]
pub fn verify_request_ids(requests: &[Request]) -> LogsAndValue<Vec<Request>> {
    let (logs, verified): (Vec<LogEntry>, Vec<Request>) =
        requests.iter().map(verify_request_id).unzip();
    LogsAndValue::new(logs, verified)
}

fn verify_request_id(request: &Request) -> (LogEntry, Request) {
    if request.status != RequestStatus::Pending {
        let log = LogEntry::debug(format!(
            "Request ID verification skipped for Request:{} as it has status:{}",
            request.id, request.status
        ));
        return (log, request.clone());
    }

    let expected = derive_request_id(request);
    if request.id != expected {
        let log = LogEntry::error(format!(
            "Invalid ID for Request:{}. Expected:{}",
            request.id, expected
        ));
        let ignored = request.with_status(
            RequestStatus::Ignored,
            Some(format!("{}: {}", ErrorKind::RequestIdInvalid, request.id)),
        );
        return (log, ignored);
    }

    let log = LogEntry::debug(format!("Request ID:{} has a valid ID", request.id));
    (log, request.clone())
}

/// Ignores pending requests whose chain id is not `chain`'s. Only
/// mismatches are logged. Output has the same length and order as
/// `requests`.
#[must_use]
pub fn verify_chain_ids(
    requests: Vec<Request>,
    chain: &ChainConfig,
) -> LogsAndValue<Vec<Request>> {
    let expected = U256::from_str_radix(&chain.id, 10).ok();
    let mut logs = Vec::new();
    let verified: Vec<Request> = requests
        .into_iter()
        .map(|request| {
            if !request.is_pending() || expected == Some(request.chain_id) {
                return request;
            }
            logs.push(LogEntry::error(format!(
                "Request ID:{} was made on chain {} but is being processed for chain {}",
                request.id, request.chain_id, chain.id
            )));
            request.with_status(
                RequestStatus::Ignored,
                Some(format!("{}: {}", ErrorKind::ChainIdMismatch, request.chain_id)),
            )
        })
        .collect();
    LogsAndValue::new(logs, verified)
}
