pub mod clients;
pub mod deps;
pub mod outbound;
pub mod reconcile;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod validation;
