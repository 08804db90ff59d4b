pub mod lifecycle;
pub mod operation;

pub use lifecycle::LifecycleService;
pub use operation::LifecycleOperations;
