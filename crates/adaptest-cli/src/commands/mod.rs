pub mod init;
pub mod report;
pub mod run;
pub mod skills;
pub mod validate;
