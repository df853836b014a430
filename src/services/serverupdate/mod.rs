//! Server update: maintenance schedules for automatic OS updates.

pub mod schedule;

pub use schedule::{ScheduleDataSource, ScheduleResource, SchedulesDataSource};
