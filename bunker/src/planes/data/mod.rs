pub mod fetch_operations;
pub mod operation;
pub mod router;

pub use fetch_operations::FetchService;
pub use operation::FetchOperations;
pub use router::{Route, RoutingTable, Strategy};
