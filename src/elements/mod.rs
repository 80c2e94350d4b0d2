//! Structural elements module

mod bar;
mod node;
mod support;

pub use bar::Bar;
pub use node::Node;
pub use support::Support;
