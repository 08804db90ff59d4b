#![deny(clippy::all)]

pub mod domain;
pub mod events;
pub mod planes;
pub mod ports;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use worker::{Worker, WorkerState};
