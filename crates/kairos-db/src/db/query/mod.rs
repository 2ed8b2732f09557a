pub mod exception;
pub mod template;
