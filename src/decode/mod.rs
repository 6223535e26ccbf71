//! Document decoding.
//!
//! # Data Flow
//! ```text
//! RawDocument
//!     → parser.rs (bytes → ParsedTree, version gate)
//!     → skeleton.rs (ParsedTree → ConfigSkeleton by field name)
//!     → postprocess/ (ParsedTree + ConfigSkeleton → CanonicalConfig candidate)
//! ```
//!
//! # Design Decisions
//! - The structural decoder never picks a variant; string tags are resolved
//!   in exactly one place per family in `postprocess`
//! - The parsed tree lives only for the duration of one decode

pub mod parser;
pub mod postprocess;
pub mod skeleton;

pub use parser::{DocumentFormat, ParsedTree, RawDocument};
