/**
 * Content fingerprints.
 *  A fingerprint is the lowercase hex SHA-256
 *  digest of a blob and its only identifier.
 */
pub mod fingerprint;
/**
 * Records exchanged between clients, storage
 *  nodes and the catalog, along with the
 *  validation rules the catalog applies.
 */
pub mod record;
/**
 * Per-node content-addressed blob storage
 *  with deduplication and an existence cache.
 */
pub mod store;
/**
 * Master-side bookkeeping: the fingerprint
 *  catalog and the static node registry.
 */
pub mod catalog;
pub mod registry;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogError};
    pub use crate::fingerprint::{Fingerprint, FINGERPRINT_HEX_LEN};
    pub use crate::record::{
        FileRecord, NodeRecord, NodeStatus, RegisterResponse, UploadResponse, ValidationError,
    };
    pub use crate::registry::NodeRegistry;
    pub use crate::store::{ContentStore, ContentStoreError};
    pub use crate::version::build_info;
}
