/// Hyperbolic tangent, the saturating nonlinearity of the recurrent cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tanh;

impl Tanh {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f32) -> f32 {
        z.tanh()
    }

    pub fn df(&self, z: f32) -> f32 {
        1. - z.tanh().powi(2)
    }
}
