// Adapters layer: concrete implementations for external systems (filesystem, portal http).

pub mod portal;
pub mod storage;
