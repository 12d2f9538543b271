//! Example application wired on top of the runtime.

pub mod initializer;
pub mod keys;

pub use initializer::ExampleInitializer;
