//! Request id derivation.
//!
//! The RRP contract derives each request id as
//! `keccak256(abi.encodePacked(...))` over the request's on-chain fields.
//! Recomputing it off-chain detects requests whose fields were altered or
//! mis-relayed between the contract and this node.
//!
//! Both variants start with the chain id, the emitting RRP contract, the
//! requester and its request count. The template variant then names the
//! template; the full variant names the airnode and endpoint instead.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;

use crate::types::{Request, RequestKind};

/// Tightly packed field tuple hashed into the id of `request`.
#[must_use]
pub fn packed_request_fields(request: &Request) -> Vec<u8> {
    let head = (
        request.chain_id,
        request.metadata.address,
        request.requester_address,
        request.request_count,
    );
    let tail = (
        request.sponsor_address,
        request.sponsor_wallet_address,
        request.fulfill_address,
        request.fulfill_function_id,
        request.encoded_parameters.clone(),
    );
    let mut packed = head.abi_encode_packed();
    match &request.kind {
        RequestKind::Template { template_id, .. } => {
            packed.extend(template_id.abi_encode_packed());
        }
        RequestKind::Full {
            airnode_address,
            endpoint_id,
        } => {
            packed.extend((*airnode_address, *endpoint_id).abi_encode_packed());
        }
    }
    packed.extend(tail.abi_encode_packed());
    packed
}

/// Id the RRP contract would have assigned to `request`.
#[must_use]
pub fn derive_request_id(request: &Request) -> B256 {
    keccak256(packed_request_fields(request))
}
