pub mod activations;
pub mod layers;
pub mod loss;
mod echo_rnn;
mod model;
mod sequential;

pub use echo_rnn::{EchoRnn, Pass, WindowStep};
pub use model::Model;
pub use sequential::Sequential;
