pub mod config;
pub mod controller;
pub mod error;
pub mod framer;
pub mod http;
pub mod hysteresis;
pub mod model_runner;
pub mod pipeline;
pub mod segment;
pub mod smoother;
pub mod wav;

pub use config::{VadOptions, VadOptionsUpdate};
pub use controller::{VadController, VadStatus};
pub use error::{Result, VadError};
