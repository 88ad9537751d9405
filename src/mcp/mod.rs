pub mod render;
pub mod requests;
pub mod tools;
