//! Shared primitive types used across the engine.

/// Stable prize identity, unique within a catalog.
/// 0 is reserved for the no-win sentinel and never appears in the catalog.
pub type PrizeId = u32;

/// A monetary amount in the smallest currency unit.
pub type Amount = u64;

/// A 1-based spin sequence number. 0 means "no spins yet".
pub type SpinNumber = u64;
