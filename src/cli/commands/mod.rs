//! Command implementations

pub mod check;
pub mod doctor;
pub mod fmt;
