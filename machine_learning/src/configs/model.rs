use serde::{Deserialize, Serialize};

use crate::dataset::InputEncoding;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnConfig {
    #[default]
    Tanh,
    Sigmoid {
        amp: f32,
    },
}

/// How a section of the parameters is initialized. The amount of values to generate and the
/// fans are taken from the section itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGenConfig {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    UniformInclusive { low: f32, high: f32 },
    XavierUniform,
    Normal { mean: f32, std_dev: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub state_size: usize,
    pub activation: ActFnConfig,
    pub input_encoding: InputEncoding,
    pub weight_init: ParamGenConfig,
    pub bias_init: ParamGenConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            state_size: 4,
            activation: ActFnConfig::Tanh,
            input_encoding: InputEncoding::Scalar,
            weight_init: ParamGenConfig::Uniform { low: 0., high: 1. },
            bias_init: ParamGenConfig::Const { value: 0. },
        }
    }
}
