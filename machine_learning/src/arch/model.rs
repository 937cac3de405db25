/// A model whose parameters live outside of it, in a flat buffer split by layer.
pub trait Model {
    /// Returns the amount of parameters of each layer, front to back.
    fn layer_sizes(&self) -> Vec<usize>;

    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize {
        self.layer_sizes().iter().sum()
    }
}
