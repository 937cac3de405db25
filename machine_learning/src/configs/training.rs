use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::{ActFnConfig, ModelConfig, ParamGenConfig};
use crate::{MlErr, Result, optimization::Adagrad};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adagrad {
        lr: f32,
        #[serde(default = "default_initial_accumulator")]
        initial_accumulator: f32,
    },
    Adam {
        lr: f32,
        b1: f32,
        b2: f32,
        eps: f32,
    },
    GradientDescent {
        lr: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adagrad {
            lr: 0.5,
            initial_accumulator: default_initial_accumulator(),
        }
    }
}

fn default_initial_accumulator() -> f32 {
    Adagrad::INITIAL_ACCUMULATOR
}

/// The configuration of an echo training run. Every field is optional in its JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EchoConfig {
    pub total_series_length: usize,
    pub truncated_backprop_length: usize,
    pub echo_step: usize,
    pub num_classes: usize,
    pub batch_size: usize,
    pub num_epochs: usize,
    /// Relative weights to draw each class with, uniform if absent.
    pub class_weights: Option<Vec<f32>>,
    pub model: ModelConfig,
    pub optimizer: OptimizerConfig,
    pub seed: Option<u64>,
    /// The amount of window losses kept for display.
    pub history_len: usize,
    pub report_every: usize,
    pub sample_every: usize,
    pub plot: bool,
    /// Where to write the trained parameters to, if anywhere.
    pub checkpoint: Option<PathBuf>,
    /// Start from the parameters in `checkpoint` when the file exists.
    pub resume: bool,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            total_series_length: 50000,
            truncated_backprop_length: 15,
            echo_step: 3,
            num_classes: 2,
            batch_size: 5,
            num_epochs: 100,
            class_weights: None,
            model: ModelConfig::default(),
            optimizer: OptimizerConfig::default(),
            seed: None,
            history_len: 2000,
            report_every: 100,
            sample_every: 500,
            plot: true,
            checkpoint: None,
            resume: false,
        }
    }
}

impl EchoConfig {
    /// Reads a configuration from the JSON file at `path`; missing fields take their default.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns how many steps of the series fit in each row.
    pub fn columns(&self) -> usize {
        self.total_series_length
            .checked_div(self.batch_size)
            .unwrap_or(0)
    }

    /// Returns how many windows are trained on each epoch.
    pub fn windows_per_epoch(&self) -> usize {
        self.columns()
            .checked_div(self.truncated_backprop_length)
            .unwrap_or(0)
    }

    /// Checks that the configuration describes a run that can be trained.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("total_series_length", self.total_series_length),
            ("truncated_backprop_length", self.truncated_backprop_length),
            ("num_classes", self.num_classes),
            ("batch_size", self.batch_size),
            ("model.state_size", self.model.state_size),
            ("history_len", self.history_len),
            ("report_every", self.report_every),
            ("sample_every", self.sample_every),
        ];

        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(MlErr::InvalidConfig(format!("{name} must be greater than 0")));
        }

        if self.windows_per_epoch() == 0 {
            return Err(MlErr::InvalidConfig(format!(
                "a row of {} steps can't fit a window of {} steps",
                self.columns(),
                self.truncated_backprop_length
            )));
        }

        if let Some(weights) = &self.class_weights {
            if weights.len() != self.num_classes {
                return Err(MlErr::InvalidConfig(format!(
                    "got {} class weights for {} classes",
                    weights.len(),
                    self.num_classes
                )));
            }

            let negative = weights.iter().any(|w| !w.is_finite() || *w < 0.);
            if negative || weights.iter().sum::<f32>() <= 0. {
                return Err(MlErr::InvalidConfig(
                    "class weights must be non negative and not all zero".into(),
                ));
            }
        }

        if let ActFnConfig::Sigmoid { amp } = self.model.activation {
            if !(amp.is_finite() && amp > 0.) {
                return Err(MlErr::InvalidConfig(format!("invalid sigmoid amp: {amp}")));
            }
        }

        if self.resume && self.checkpoint.is_none() {
            return Err(MlErr::InvalidConfig(
                "resume needs a checkpoint to resume from".into(),
            ));
        }

        validate_param_gen("model.weight_init", self.model.weight_init)?;
        validate_param_gen("model.bias_init", self.model.bias_init)?;
        validate_optimizer(self.optimizer)
    }
}

fn validate_param_gen(name: &str, param_gen: ParamGenConfig) -> Result<()> {
    let valid = match param_gen {
        ParamGenConfig::Const { value } => value.is_finite(),
        ParamGenConfig::Uniform { low, high } => low < high,
        ParamGenConfig::UniformInclusive { low, high } => low <= high,
        ParamGenConfig::XavierUniform => true,
        ParamGenConfig::Normal { mean, std_dev } => mean.is_finite() && std_dev.is_finite(),
    };

    if !valid {
        return Err(MlErr::InvalidConfig(format!("{name}: invalid {param_gen:?}")));
    }

    Ok(())
}

fn validate_optimizer(optimizer: OptimizerConfig) -> Result<()> {
    let lr = match optimizer {
        OptimizerConfig::Adagrad {
            lr,
            initial_accumulator,
        } => {
            if initial_accumulator <= 0. {
                return Err(MlErr::InvalidConfig(
                    "adagrad's initial_accumulator must be greater than 0".into(),
                ));
            }
            lr
        }
        OptimizerConfig::Adam { lr, .. } | OptimizerConfig::GradientDescent { lr } => lr,
    };

    if !(lr.is_finite() && lr > 0.) {
        return Err(MlErr::InvalidConfig(format!("invalid learning rate: {lr}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InputEncoding;

    #[test]
    fn defaults() {
        let config = EchoConfig::default();
        config.validate().unwrap();

        assert_eq!(config.columns(), 10000);
        assert_eq!(config.windows_per_epoch(), 666);
        assert_eq!(
            config.optimizer,
            OptimizerConfig::Adagrad {
                lr: 0.5,
                initial_accumulator: 0.1
            }
        );
    }

    #[test]
    fn partial_json() {
        let json = r#"{
            "num_epochs": 2,
            "seed": 7,
            "plot": false,
            "model": { "state_size": 8, "input_encoding": "one_hot", "activation": { "sigmoid": { "amp": 1.0 } } },
            "optimizer": { "adagrad": { "lr": 0.3 } }
        }"#;

        let config: EchoConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.num_epochs, 2);
        assert_eq!(config.seed, Some(7));
        assert!(!config.plot);
        assert_eq!(config.model.state_size, 8);
        assert_eq!(config.model.input_encoding, InputEncoding::OneHot);
        assert_eq!(config.model.activation, ActFnConfig::Sigmoid { amp: 1. });
        assert_eq!(
            config.optimizer,
            OptimizerConfig::Adagrad {
                lr: 0.3,
                initial_accumulator: 0.1
            }
        );
        assert_eq!(config.batch_size, 5);
    }

    #[test]
    fn unknown_fields() {
        assert!(serde_json::from_str::<EchoConfig>(r#"{ "epochs": 3 }"#).is_err());
    }

    #[test]
    fn invalid_configs() {
        let invalid = [
            EchoConfig {
                batch_size: 0,
                ..Default::default()
            },
            EchoConfig {
                total_series_length: 20,
                ..Default::default()
            },
            EchoConfig {
                class_weights: Some(vec![1.]),
                ..Default::default()
            },
            EchoConfig {
                class_weights: Some(vec![0., 0.]),
                ..Default::default()
            },
            EchoConfig {
                resume: true,
                ..Default::default()
            },
            EchoConfig {
                optimizer: OptimizerConfig::GradientDescent { lr: 0. },
                ..Default::default()
            },
            EchoConfig {
                model: ModelConfig {
                    weight_init: ParamGenConfig::Uniform { low: 1., high: 0. },
                    ..Default::default()
                },
                ..Default::default()
            },
        ];

        for config in invalid {
            assert!(
                matches!(config.validate(), Err(MlErr::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn missing_file() {
        let err = EchoConfig::from_json_file("/nonexistent/echo.json").unwrap_err();
        assert!(matches!(err, MlErr::Io(_)));
    }
}
