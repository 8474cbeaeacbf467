pub mod options;
pub mod report;
pub mod studio;
pub mod weave;
