pub mod check_config;
pub mod normalize;
pub mod run;

pub use check_config::{check_config, CheckConfigArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use run::{run, RunArgs};
