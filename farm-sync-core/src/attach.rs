//! Resolving a remote log's asset/area references against the local cache.

use crate::models::{Area, Asset, RemoteLog, ResourceRef};
use crate::store::Keyed;

/// Local resources matched by a remote log's references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachments {
    pub assets: Vec<Asset>,
    pub areas: Vec<Area>,
}

/// Collects the local assets and areas referenced by `remote`.
///
/// References with no local counterpart are dropped.
pub fn resolve(remote: &RemoteLog, assets: &[Asset], areas: &[Area]) -> Attachments {
    Attachments {
        assets: attached(&remote.field_farm_asset, assets),
        areas: attached(&remote.field_farm_area, areas),
    }
}

/// Every resource whose key appears among `refs`, in local cache order.
/// A resource referenced more than once is attached once.
fn attached<R>(refs: &[ResourceRef], resources: &[R]) -> Vec<R>
where
    R: Keyed<Key = String>,
{
    resources
        .iter()
        .filter(|resource| {
            let key = resource.key();
            refs.iter().any(|reference| reference.id == key)
        })
        .cloned()
        .collect()
}
