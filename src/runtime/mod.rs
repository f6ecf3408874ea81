pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod native;
pub mod value;
