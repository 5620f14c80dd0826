pub mod admin;
pub mod feed;
