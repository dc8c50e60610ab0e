//! Container runtime implementations.
pub mod lxc;
