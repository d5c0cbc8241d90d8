pub mod allocation;
pub mod schedules;
