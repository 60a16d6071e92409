pub mod letter;
pub mod upload;
pub mod user;
