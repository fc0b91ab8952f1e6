mod area;
mod asset;
mod local_id;
mod log;
mod remote;

pub use area::{Area, Category, Unit};
pub use asset::{Asset, EQUIPMENT};
pub use local_id::{LocalId, LocalIdError};
pub use log::{Fields, Log, LogPatch, NewLog};
pub use remote::{
    is_reserved_field, ListResponse, LogPayload, OutboundLog, PushReceipt, RemoteLog,
    ResourceRef, RESERVED_FIELDS,
};
