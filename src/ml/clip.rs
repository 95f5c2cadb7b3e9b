// ============================================================
// Layer 5 — Global-Norm Gradient Clipping
// ============================================================
// Rescales the gradients of ALL parameters together so that
//
//   ‖g‖ = sqrt( Σ_params Σ_elements g² )  ≤  max_norm
//
//   if ‖g‖ > max_norm:  g ← g · (max_norm / ‖g‖)
//
// Burn's built-in GradientClipping works per parameter tensor,
// which changes the direction of the overall update. Here the
// module is walked twice with a ModuleVisitor: once to add up
// the squared norm, once to rescale every gradient by the same
// factor.
//
// Reference: Pascanu et al. (2013) On the difficulty of training RNNs

use std::marker::PhantomData;

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads: &'a GradientsParams,
    total: f64,
    _b:    PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.total += (grad.clone() * grad).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale<'a, B: AutodiffBackend> {
    grads:  &'a mut GradientsParams,
    factor: f64,
    _b:     PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register(id, grad.mul_scalar(self.factor));
        }
    }
}

/// Global L2 norm of every gradient that belongs to `module`.
pub fn global_norm<B, M>(module: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm::<B> { grads, total: 0.0, _b: PhantomData };
    module.visit(&mut visitor);
    visitor.total.sqrt()
}

/// Clip to `max_norm` and return the norm measured BEFORE clipping.
/// A non-positive `max_norm` disables clipping.
pub fn clip_global_norm<B, M>(module: &M, mut grads: GradientsParams, max_norm: f64) -> (GradientsParams, f64)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm = global_norm::<B, M>(module, &grads);
    if max_norm > 0.0 && norm.is_finite() && norm > max_norm {
        let mut visitor = Rescale::<B> { grads: &mut grads, factor: max_norm / norm, _b: PhantomData };
        module.visit(&mut visitor);
    }
    (grads, norm)
}
