//! # Revision Annotation
//!
//! Counter of address-changing updates, stored on the Gateway as a decimal string.

use crate::constants::REVISION_ANNOTATION;
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::Gateway;
use std::collections::BTreeMap;

/// Current revision; absent or empty means zero.
///
/// A value that is not a non-negative integer is an error rather than a
/// reset, since resetting would make the counter go backwards.
pub fn current_revision(annotations: &BTreeMap<String, String>) -> Result<u64, ReconcilerError> {
    match annotations.get(REVISION_ANNOTATION).map(String::as_str) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse::<u64>()
            .map_err(|source| ReconcilerError::InvalidRevision {
                annotation: REVISION_ANNOTATION,
                value: value.to_string(),
                source,
            }),
    }
}

/// Increment the revision annotation by one and return the new value.
pub fn bump_revision(gateway: &mut Gateway) -> Result<u64, ReconcilerError> {
    let annotations = gateway.metadata.annotations.get_or_insert_with(BTreeMap::new);
    let next = current_revision(annotations)?
        .checked_add(1)
        .ok_or(ReconcilerError::RevisionOverflow(REVISION_ANNOTATION))?;
    annotations.insert(REVISION_ANNOTATION.to_string(), next.to_string());
    Ok(next)
}
