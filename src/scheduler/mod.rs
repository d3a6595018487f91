pub mod location;
pub mod runner;
pub mod storage;

pub use location::{NewLocation, NotificationEvent, Owner, WatchedLocation};
pub use runner::{NotificationScheduler, SchedulerMode, SchedulerStatus, TickReport};
pub use storage::{FileLocationStore, LocationStore, StorageError};
