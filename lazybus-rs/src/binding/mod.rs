//! Bindings: listener references and the container slot they resolve through.

mod reference;
mod slot;

pub use reference::{IntoListenerRef, ListenerRef};
pub use slot::ContainerSlot;
