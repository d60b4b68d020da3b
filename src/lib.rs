pub mod chain;
pub mod cli;
pub mod config;
pub mod fork;
pub mod positions;
pub mod proxy;
pub mod registry;
pub mod subs;
pub mod swap;
pub mod tokens;
