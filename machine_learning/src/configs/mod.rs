mod model;
mod training;

pub use model::{ActFnConfig, ModelConfig, ParamGenConfig};
pub use training::{EchoConfig, OptimizerConfig};
