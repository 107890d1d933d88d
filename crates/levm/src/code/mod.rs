//! Legacy code analysis (C1 jumpdest map, C2 padding) and the EOF/legacy dispatcher
//! (C5).

pub mod analysis;
pub mod jumpdest;
pub mod padding;

pub use analysis::{analyze, CodeAnalysis};
pub use jumpdest::JumpdestMap;
pub use padding::pad_code;
