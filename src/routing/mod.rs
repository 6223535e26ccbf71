//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (listener, path)
//!     → router.rs (endpoint lookup, ordered route scan)
//!     → matcher.rs (evaluate route condition)
//!     → Return: RouteResolution or None
//!
//! Route Compilation (on every reload signal):
//!     ConfigStore::get()
//!     → Compile matchers per endpoint
//!     → Swap in as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Compiled tables are immutable; reload swaps the whole table
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (document order)

pub mod matcher;
pub mod router;

pub use matcher::{GrpcServiceMatcher, HttpPathPrefixMatcher, RequestMatcher};
pub use router::{RouteRegistry, RouteResolution, RouteTable};
