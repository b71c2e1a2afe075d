pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod error;
pub mod ranker;
pub mod validator;
