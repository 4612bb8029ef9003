pub mod archive;
pub mod patch;
pub mod source;
pub mod swap;
pub mod workspace;

pub use archive::{extract_package, repack_package};
pub use patch::{PatchSummary, PatchTarget, ProtectionPatcher};
pub use source::{DocumentKind, SourceFile};
pub use swap::{move_file, swap_into_place};
pub use workspace::ScratchSpace;
