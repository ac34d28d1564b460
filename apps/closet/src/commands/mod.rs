pub mod config;
pub mod forget;
pub mod inspect;
pub mod pipeline;
