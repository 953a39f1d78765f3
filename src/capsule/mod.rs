/*!
 * Capsule Module
 * Tenant layout, storage access, virtual-host routing and first-run setup
 */

pub mod layout;
pub mod router;
pub mod scaffold;
pub mod store;

pub use layout::Capsule;
pub use router::{declares_host, TenantRouter};
pub use scaffold::scaffold_capsule;
pub use store::{CapsuleStore, FsCapsuleStore, MemoryCapsuleStore};
