//! Events: container-aware dispatcher and the subscriber table.

mod lazy;
mod table;

pub use lazy::ContainerAwareDispatcher;
pub use table::SubscriberTable;
