//! Database entities for the flyer-distribution domain.
//!
//! Customers, orders, and flyers are collaborator-owned records the core only
//! reads; areas are immutable reference data. The allocation engine owns
//! `order_distribution`, `order_distribution_area`, `schedule`, and
//! `distribution_item`.

pub mod area;
pub mod customer;
pub mod distribution_item;
pub mod flyer;
pub mod order;
pub mod order_distribution;
pub mod order_distribution_area;
pub mod schedule;
