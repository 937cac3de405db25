mod echo;

pub use echo::{EchoGenerator, EchoSeries, InputEncoding, Window, Windows, echo};
