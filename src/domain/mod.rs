// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing the captioning dataset.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Caption rows and the table they form
pub mod caption;

// Core abstractions (traits) that other layers implement
pub mod traits;
