pub mod ast;
pub mod token;
pub mod lexer;
pub mod analyzer;
pub mod explain;
pub mod config;
pub mod builder;
pub mod schema;
pub mod storage;
pub mod session;
