// Library for tests to access modules

pub mod aggregation;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod smbstatus;
pub mod version;
pub mod versions;
