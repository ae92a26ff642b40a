pub mod archive;
pub mod forecast;
pub mod report;
