pub mod issues;
pub mod modules;
pub mod selections;
pub mod sponsors;
pub mod units;
