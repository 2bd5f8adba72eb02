pub mod client;
pub mod context;
pub mod envelope;

pub use client::*;
pub use context::*;
pub use envelope::*;
