/// Router Module Index
///
/// Routing is split by access: each module's routes are either all public or all
/// behind the auth gate, except the resource factory, which splits per operation.

/// Routes accessible to anyone.
pub mod public;

/// Routes that require a verified identity.
pub mod authenticated;

/// The per-collection CRUD router factory.
pub mod resources;
