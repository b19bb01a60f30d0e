/// Event queue ordering and clock edges.
pub mod event;


/// Trace parsing and request sources.
pub mod traffic;
