//! Personal vehicle maintenance tracker: a rule catalog per drivetrain
//! category, a pure due-status inference engine, a reminder scan with a
//! notification cooldown, and a printable service record.

pub mod config;
pub mod error;
pub mod garage;
pub mod telemetry;
