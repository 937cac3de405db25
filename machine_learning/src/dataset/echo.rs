use ndarray::{Array2, Array3, ArrayView2, s};
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// How a window's class labels are fed to the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEncoding {
    /// The class index itself, as a single float.
    #[default]
    Scalar,
    /// A one-hot vector as wide as the amount of classes.
    OneHot,
}

impl InputEncoding {
    /// Returns the width of a single encoded step.
    pub fn width(&self, num_classes: usize) -> usize {
        match self {
            Self::Scalar => 1,
            Self::OneHot => num_classes,
        }
    }
}

/// Delays `series` by `shift` steps: the result is `series` rotated right by `shift`, with the
/// wrapped-around prefix set to class `0`.
pub fn echo(series: &[usize], shift: usize) -> Vec<usize> {
    let len = series.len();
    if shift >= len {
        return vec![0; len];
    }

    let mut echoed = series.to_vec();
    echoed.rotate_right(shift);
    echoed[..shift].fill(0);
    echoed
}

/// Generates random echo series.
#[derive(Debug, Clone)]
pub struct EchoGenerator {
    total_len: usize,
    batch_size: usize,
    echo_step: usize,
    num_classes: usize,
    class_weights: Option<WeightedIndex<f32>>,
}

impl EchoGenerator {
    /// Creates a new `EchoGenerator` drawing every class with the same probability.
    ///
    /// # Arguments
    /// * `total_len` - The length of the generated sequence.
    /// * `batch_size` - The amount of rows the sequence is laid out in.
    /// * `echo_step` - How many steps the target lags behind the input.
    /// * `num_classes` - The amount of classes to draw from.
    ///
    /// # Returns
    /// A new `EchoGenerator` or an error if the sequence can't fill a single column.
    pub fn new(
        total_len: usize,
        batch_size: usize,
        echo_step: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if batch_size == 0 || num_classes == 0 {
            return Err(MlErr::InvalidConfig(
                "batch_size and num_classes must be positive".into(),
            ));
        }

        if total_len < batch_size {
            return Err(MlErr::InvalidConfig(format!(
                "a series of {total_len} steps can't fill {batch_size} rows"
            )));
        }

        Ok(Self {
            total_len,
            batch_size,
            echo_step,
            num_classes,
            class_weights: None,
        })
    }

    /// Draws classes with the given relative weights instead of uniformly.
    pub fn with_class_weights(mut self, weights: &[f32]) -> Result<Self> {
        if weights.len() != self.num_classes {
            return Err(MlErr::InvalidConfig(format!(
                "got {} class weights for {} classes",
                weights.len(),
                self.num_classes
            )));
        }

        let dist = WeightedIndex::new(weights)
            .map_err(|e| MlErr::InvalidConfig(format!("invalid class weights: {e}")))?;

        self.class_weights = Some(dist);
        Ok(self)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns the amount of steps in each row of the generated series.
    pub fn columns(&self) -> usize {
        self.total_len / self.batch_size
    }

    /// Draws a new input sequence and derives its echo.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<EchoSeries> {
        let sequence = (0..self.total_len)
            .map(|_| match &self.class_weights {
                Some(dist) => dist.sample(rng),
                None => rng.random_range(0..self.num_classes),
            })
            .collect();

        EchoSeries::from_sequence(sequence, self.echo_step, self.batch_size)
    }
}

/// An input sequence and its echo, both laid out row-major as `[batch_size, columns]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoSeries {
    x: Array2<usize>,
    y: Array2<usize>,
}

impl EchoSeries {
    /// Builds the series for `sequence`. The trailing steps that don't fill a whole row are
    /// discarded after the echo is computed.
    pub fn from_sequence(sequence: Vec<usize>, echo_step: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(MlErr::InvalidConfig("batch_size must be positive".into()));
        }

        let columns = sequence.len() / batch_size;
        let used = columns * batch_size;

        let mut echoed = echo(&sequence, echo_step);
        echoed.truncate(used);
        let mut sequence = sequence;
        sequence.truncate(used);

        Ok(Self {
            x: Array2::from_shape_vec((batch_size, columns), sequence)?,
            y: Array2::from_shape_vec((batch_size, columns), echoed)?,
        })
    }

    pub fn x(&self) -> ArrayView2<'_, usize> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView2<'_, usize> {
        self.y.view()
    }

    pub fn batch_size(&self) -> usize {
        self.x.nrows()
    }

    pub fn columns(&self) -> usize {
        self.x.ncols()
    }

    /// Returns how many whole windows of `window_len` steps fit in a row.
    pub fn window_count(&self, window_len: usize) -> usize {
        self.columns().checked_div(window_len).unwrap_or(0)
    }

    /// Iterates the contiguous, non-overlapping windows of `window_len` steps. The steps left
    /// after the last whole window are never visited.
    pub fn windows(&self, window_len: usize) -> Windows<'_> {
        Windows {
            series: self,
            window_len,
            next: 0,
            count: self.window_count(window_len),
        }
    }

    /// Returns the `index`-th window of `window_len` steps, if it exists.
    pub fn window(&self, window_len: usize, index: usize) -> Option<Window<'_>> {
        if index >= self.window_count(window_len) {
            return None;
        }

        let start = index * window_len;
        let end = start + window_len;

        Some(Window {
            index,
            x: self.x.slice(s![.., start..end]),
            y: self.y.slice(s![.., start..end]),
        })
    }
}

/// An iterator over the windows of an `EchoSeries`.
pub struct Windows<'a> {
    series: &'a EchoSeries,
    window_len: usize,
    next: usize,
    count: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.series.window(self.window_len, self.next)?;
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// A `[batch_size, window_len]` slice of an `EchoSeries`.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub index: usize,
    pub x: ArrayView2<'a, usize>,
    pub y: ArrayView2<'a, usize>,
}

impl Window<'_> {
    /// Encodes the window's inputs as a `[batch_size, window_len, width]` tensor.
    pub fn inputs(&self, encoding: InputEncoding, num_classes: usize) -> Array3<f32> {
        match encoding {
            InputEncoding::Scalar => {
                let (rows, steps) = self.x.dim();
                Array3::from_shape_fn((rows, steps, 1), |(b, t, _)| self.x[[b, t]] as f32)
            }
            InputEncoding::OneHot => one_hot(self.x, num_classes),
        }
    }

    /// Encodes the window's targets as a one-hot `[batch_size, window_len, num_classes]`
    /// tensor.
    pub fn targets(&self, num_classes: usize) -> Array3<f32> {
        one_hot(self.y, num_classes)
    }
}

/// Labels outside of `0..num_classes` encode as all zeros.
fn one_hot(labels: ArrayView2<usize>, num_classes: usize) -> Array3<f32> {
    let (rows, steps) = labels.dim();
    Array3::from_shape_fn((rows, steps, num_classes), |(b, t, c)| {
        (labels[[b, t]] == c) as u8 as f32
    })
}
