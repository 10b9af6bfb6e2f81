//! Console domain types.
//!
//! Pure data with no infrastructure dependencies. The runtime crate builds
//! the assembly engine on top of these.

mod flush;
mod fragment;
mod line_type;

pub use flush::ConsoleFlush;
pub use fragment::{Fragment, SourceKey};
pub use line_type::{LineType, ParseLineTypeError};
