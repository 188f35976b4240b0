pub mod codec;
pub mod collect;
pub mod config;
pub mod domain;
pub mod expr;
pub mod jobs;
pub mod pipeline;
pub mod programs;
pub mod serialization;
