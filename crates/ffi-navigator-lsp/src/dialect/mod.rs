//! Dialect Providers
//!
//! A dialect is one framework's FFI convention: which macros register a
//! key, which calls look one up and how the Python side re-exports them.
//!
//! - `traits`: The provider contract
//! - `registry`: Dialect detection and instantiation
//! - `plugins`: The built-in conventions (TVM, DGL, MXNet, PyTorch, Taichi)

pub mod plugins;
pub mod registry;
pub mod traits;


pub use plugins::{
    DglProvider, MxnetProvider, NoopProvider, TaichiProvider, TorchProvider, TvmProvider,
};
pub use registry::{DialectKind, DialectRegistry};
pub use traits::{first_touching, package_root_of_init, DialectProvider, SourceKind};
