pub mod animate;
pub mod backfill;
pub mod config;
pub mod error;
pub mod example;
pub mod load;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod run;
pub mod schema;
pub mod transform;
