pub mod error;
pub mod locations;
pub mod overpasses;
pub mod scheduler;
