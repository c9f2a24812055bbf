//! Single layer softmax regression, the MNIST baseline.
use convnet_core::internal::*;
use ndarray::{ArrayView2, Axis};
use convnet_core::ops::nn::{Dense, Reduce, Reducer, SoftmaxCrossEntropy, softmax_cross_entropy_loss};

use crate::graph::NetworkGraph;

/// `y = x · W + b` over flattened images, trained against one-hot labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct LinearSoftmax {
    pub input_dim: usize,
    pub num_classes: usize,
}

impl Default for LinearSoftmax {
    fn default() -> LinearSoftmax {
        LinearSoftmax { input_dim: 784, num_classes: 10 }
    }
}

impl LinearSoftmax {
    pub fn inference(&self, batch_size: usize) -> NetResult<NetworkGraph> {
        let mut model = TypedModel::default();
        let x = model.add_source("x", TypedFact::f32([batch_size, self.input_dim]))?;
        let dense = Dense::new(self.input_dim, self.num_classes, true);
        let y = model.wire_node("y", dense, &[x])?[0];
        NetworkGraph::new(model, y, None)
    }

    /// Batch mean of the softmax cross-entropy against dense labels.
    pub fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> NetResult<f32> {
        softmax_cross_entropy_loss(logits, labels)
    }

    pub fn wire_loss(
        model: &mut TypedModel,
        logits: OutletId,
        labels: OutletId,
    ) -> NetResult<OutletId> {
        let xent = model.wire_node("cross_entropy", SoftmaxCrossEntropy, &[logits, labels])?;
        let mean = Reduce::new(tvec!(0), Reducer::Mean, false);
        Ok(model.wire_node("cross_entropy_mean", mean, &xent)?[0])
    }

    /// Fraction of rows where the highest logit matches the highest label.
    pub fn accuracy(&self, logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> NetResult<f32> {
        if logits.shape() != labels.shape() || logits.nrows() == 0 {
            bail!(NetError::ShapeMismatch(format!(
                "logits {:?} and labels {:?}",
                logits.shape(),
                labels.shape()
            )))
        }
        let argmax = |row: ndarray::ArrayView1<f32>| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (ix, &v)| if v > best.1 { (ix, v) } else { best })
                .0
        };
        let correct = logits
            .axis_iter(Axis(0))
            .zip(labels.axis_iter(Axis(0)))
            .filter(|(l, y)| argmax(l.view()) == argmax(y.view()))
            .count();
        Ok(correct as f32 / logits.nrows() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, arr2};

    #[test]
    fn graph() {
        let graph = LinearSoftmax::default().inference(100).unwrap();
        assert_eq!(graph.output_fact().unwrap(), &TypedFact::f32([100, 10]));
        assert_eq!(graph.model().parameter_count().unwrap(), 784 * 10 + 10);
    }

    #[test]
    fn wired_loss_is_scalar() {
        let mut model = LinearSoftmax::default().inference(100).unwrap().into_model();
        let labels = model.add_source("y_", TypedFact::f32([100, 10])).unwrap();
        let logits = model.output_outlets()[0];
        let loss = LinearSoftmax::wire_loss(&mut model, logits, labels).unwrap();
        assert_eq!(model.outlet_fact(loss).unwrap().shape.len(), 0);
    }

    #[test]
    fn zero_weights_loss() {
        let linear = LinearSoftmax::default();
        let logits = Array2::<f32>::zeros((3, 10));
        let mut labels = Array2::<f32>::zeros((3, 10));
        labels[(0, 1)] = 1.0;
        labels[(1, 4)] = 1.0;
        labels[(2, 9)] = 1.0;
        let loss = linear.loss(logits.view(), labels.view()).unwrap();
        assert_abs_diff_eq!(loss, 10f32.ln(), epsilon = 1e-6);
    }

    #[test]
    fn accuracy() {
        let linear = LinearSoftmax::new(2, 3);
        let logits = arr2(&[[0.1f32, 2.0, 0.3], [1.0, 0.0, 0.0]]);
        let labels = arr2(&[[0f32, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_abs_diff_eq!(linear.accuracy(logits.view(), labels.view()).unwrap(), 0.5);
    }
}
