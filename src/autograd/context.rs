//! Request-scoped execution mode

use crate::autograd::Tensor;

/// Execution mode for one forward computation.
///
/// Passed explicitly into every forward call. In evaluation mode parameters
/// are bound detached, so nothing is recorded for a reverse pass.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    training: bool,
}

impl Context {
    pub fn new() -> Self {
        Self { training: true }
    }

    /// Evaluation-mode context.
    pub fn inference() -> Self {
        Self { training: false }
    }

    pub fn train(&mut self) {
        self.training = true;
    }

    pub fn eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Bring a parameter into the current computation.
    pub fn bind(&self, param: &Tensor) -> Tensor {
        if self.training {
            param.clone()
        } else {
            param.detach()
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
