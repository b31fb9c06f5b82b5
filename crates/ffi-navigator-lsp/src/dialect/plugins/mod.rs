//! Dialect Plugins
//!
//! One provider per supported framework. Each implements the
//! `DialectProvider` trait on top of the core pattern toolkit.
//!
//! TVM and DGL share the packed-function convention in `packed`.

mod dgl;
mod mxnet;
mod noop;
mod packed;
mod taichi;
mod torch;
mod tvm;

pub use dgl::DglProvider;
pub use mxnet::MxnetProvider;
pub use noop::NoopProvider;
pub use taichi::TaichiProvider;
pub use torch::TorchProvider;
pub use tvm::TvmProvider;
