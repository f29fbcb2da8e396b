//! ServiceProvider: register a group of services into a container.

use crate::container::{Container, ContainerError};

/// Registers related services in one step. Use with `Container::register`.
pub trait ServiceProvider {
    fn register_into(&mut self, container: &mut Container) -> Result<(), ContainerError>;
}
