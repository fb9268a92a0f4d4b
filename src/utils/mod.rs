pub mod browser;
pub mod cookies;
