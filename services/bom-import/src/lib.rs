//! ION BOM Import
//!
//! Rebuilds an assembly tree from a level-indented BOM export and mirrors it
//! into ION as parts and MBOM items. Re-running an import never duplicates
//! parts; links that already exist are reported per row.

pub mod remote;
pub mod memory;
pub mod ion_client;
pub mod resolver;
pub mod linker;
pub mod driver;

pub use driver::{run_import, ImportAborted, ImportDriver, ImportOptions};
pub use ion_client::IonClient;
pub use linker::LinkMaterializer;
pub use memory::{CallCounts, InMemoryPartsApi};
pub use remote::{PartsApi, RemoteError};
pub use resolver::PartResolver;
