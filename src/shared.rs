pub mod fs_atomic;
pub mod logging;
pub mod paths;
pub mod serde_ext;
