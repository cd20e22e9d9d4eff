pub mod account;
pub mod engagement;
pub mod outcome;
pub mod report;
