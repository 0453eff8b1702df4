/// Half squared error for the single sigmoid output.
///
/// The ½ factor cancels the exponent's 2 so the derivative is the raw error.
pub struct MseLoss;

impl MseLoss {
    /// Scalar loss: ½·(predicted − expected)²
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        let error = predicted - expected;
        0.5 * error * error
    }

    /// ∂L/∂predicted: predicted − expected
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        predicted - expected
    }
}
