//! # Address Resolver
//!
//! Computes the address list a Gateway should advertise from the ready
//! secondary resources that reference it.

use crate::controller::source::AddressSource;
use crate::controller::store::{ResourceStore, StoreError};
use crate::crd::{GatewayAddress, GatewayRef};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Desired `spec.addresses` for `id`, sorted by value.
///
/// Objects that are not ready contribute nothing. Duplicate values coming
/// from different objects are kept.
pub async fn resolve<S: AddressSource>(
    source: &S,
    store: &dyn ResourceStore,
    id: &GatewayRef,
    cancel: &CancellationToken,
) -> Result<Vec<GatewayAddress>, StoreError> {
    let objects = source.list_matching(store, id, cancel).await?;
    let listed = objects.len();

    let mut addresses: Vec<GatewayAddress> = objects
        .iter()
        .filter(|obj| source.is_ready(obj))
        .flat_map(|obj| source.extract_addresses(obj))
        .map(GatewayAddress::ip)
        .collect();

    addresses.sort_by(|a, b| a.value.cmp(&b.value));

    debug!(
        gateway = %id,
        source = S::NAME,
        listed,
        addresses = addresses.len(),
        "resolved gateway addresses"
    );
    Ok(addresses)
}
