//! LSTM cell

use crate::autograd::{
    add, add_row_bias, matmul, mul, sigmoid, slice_cols, sub, tanh, Context, Tensor,
};
use rand::rngs::StdRng;

use super::state::LayerState;
use super::uniform_param;

/// Added to the forget-gate bias at initialisation so the cell starts out
/// remembering.
pub const FORGET_BIAS: f32 = 1.0;

/// Single LSTM layer.
///
/// Gates `[i, f, g, o] = x·W_x + h·W_h + b`,
/// `c' = σ(f)·c + σ(i)·tanh(g)`, `h' = σ(o)·tanh(c')`.
pub struct LstmCell {
    /// Input weights (input_size x 4·hidden)
    pub w_x: Tensor,
    /// Recurrent weights (hidden x 4·hidden)
    pub w_h: Tensor,
    /// Gate bias (4·hidden)
    pub bias: Tensor,
    input_size: usize,
    hidden_size: usize,
}

impl LstmCell {
    pub fn new(input_size: usize, hidden_size: usize, init_scale: f32, rng: &mut StdRng) -> Self {
        let gates = 4 * hidden_size;
        let mut bias = vec![0.0; gates];
        bias[hidden_size..2 * hidden_size].fill(FORGET_BIAS);
        Self {
            w_x: uniform_param(input_size * gates, init_scale, rng),
            w_h: uniform_param(hidden_size * gates, init_scale, rng),
            bias: Tensor::from_vec(bias, true),
            input_size,
            hidden_size,
        }
    }

    /// One step for a batch.
    ///
    /// `alive` and `dead` are complementary `[batch · hidden]` 0/1 masks. Rows
    /// marked dead keep `state` and emit zero.
    pub fn step(
        &self,
        x: &Tensor,
        state: &LayerState,
        alive: &Tensor,
        dead: &Tensor,
        batch: usize,
        ctx: &Context,
    ) -> (Tensor, LayerState) {
        let (n, hs) = (batch, self.hidden_size);
        let gates = add_row_bias(
            &add(
                &matmul(x, &ctx.bind(&self.w_x), n, self.input_size, 4 * hs),
                &matmul(&state.h, &ctx.bind(&self.w_h), n, hs, 4 * hs),
            ),
            &ctx.bind(&self.bias),
            n,
            4 * hs,
        );

        let gate = |k: usize| slice_cols(&gates, n, 4 * hs, k * hs, hs);
        let input_gate = sigmoid(&gate(0));
        let forget_gate = sigmoid(&gate(1));
        let candidate = tanh(&gate(2));
        let output_gate = sigmoid(&gate(3));

        let c_next = add(&mul(&forget_gate, &state.c), &mul(&input_gate, &candidate));
        let h_next = mul(&output_gate, &tanh(&c_next));

        let next = LayerState {
            c: add(&mul(&c_next, alive), &mul(&state.c, dead)),
            h: add(&mul(&h_next, alive), &mul(&state.h, dead)),
        };
        (mul(&h_next, alive), next)
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w_x, &mut self.w_h, &mut self.bias]
    }
}

/// `1 - mask`
pub(crate) fn complement(mask: &Tensor) -> Tensor {
    sub(&Tensor::new(ndarray::Array1::ones(mask.len()), false), mask)
}
