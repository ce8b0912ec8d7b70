// Modular tools
pub mod cache;
pub mod document;
pub mod fetch;
pub mod url;
