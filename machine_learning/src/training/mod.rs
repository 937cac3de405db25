mod builder;
mod events;
mod history;
mod param_manager;
mod reporter;
mod trainer;

pub use builder::TrainerBuilder;
pub use events::{Observer, TrainingEvent, WindowReport};
pub use history::LossHistory;
pub use param_manager::{BackIter, FrontIter, ParamManager};
pub use reporter::LogReporter;
pub use trainer::{EchoTrainer, Phase, TrainingSummary};
