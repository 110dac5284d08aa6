pub mod auth;
pub mod club;
pub mod filter;
pub mod page;
pub mod report;
pub mod season;
pub mod user;
