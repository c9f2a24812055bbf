//! Softmax cross-entropy, the loss leaves of classification networks.
use crate::internal::*;
use ndarray::prelude::*;

fn check_batch(logits: &[usize], labels: &[usize]) -> NetResult<()> {
    if logits.len() != 2 {
        bail!(NetError::ShapeMismatch(format!(
            "logits must be [batch, num_classes], got {logits:?}"
        )))
    }
    if labels.first() != Some(&logits[0]) {
        bail!(NetError::ShapeMismatch(format!(
            "logits batch is {}, labels shape is {:?}",
            logits[0], labels
        )))
    }
    Ok(())
}

/// `log(sum(exp(row)))`, computed with the max subtracted.
fn logsumexp(row: ArrayView1<f32>) -> f32 {
    let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
    max + row.fold(0f32, |acc, &x| acc + (x - max).exp()).ln()
}

/// Per-example cross-entropy between logits `[batch, num_classes]` and
/// integer class labels `[batch]`.
#[derive(Debug, Clone, Default)]
pub struct SparseSoftmaxCrossEntropy;

impl SparseSoftmaxCrossEntropy {
    pub fn eval(&self, logits: ArrayView2<f32>, labels: ArrayView1<i64>) -> NetResult<Array1<f32>> {
        check_batch(logits.shape(), labels.shape())?;
        let classes = logits.shape()[1];
        logits
            .outer_iter()
            .zip(labels.iter())
            .map(|(row, &label)| {
                if label < 0 || label as usize >= classes {
                    bail!(NetError::InvalidParameter(format!(
                        "label {label} outside of [0, {classes})"
                    )))
                }
                Ok(logsumexp(row) - row[label as usize])
            })
            .collect()
    }
}

impl Op for SparseSoftmaxCrossEntropy {
    fn name(&self) -> Cow<str> {
        "SparseSoftmaxCrossEntropy".into()
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let (logits, labels) = args_2!(inputs);
        check_batch(&logits.shape, &labels.shape)?;
        if !logits.datum_type.is_float() || !labels.datum_type.is_integer() || labels.rank() != 1
        {
            bail!(NetError::ShapeMismatch(format!(
                "expects f32 logits and rank 1 integer labels, got {logits:?} and {labels:?}"
            )))
        }
        Ok(tvec!(TypedFact::f32([logits.shape[0]])))
    }
}

/// Per-example cross-entropy between logits and dense (one-hot or soft)
/// label distributions, both `[batch, num_classes]`.
#[derive(Debug, Clone, Default)]
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    pub fn eval(&self, logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> NetResult<Array1<f32>> {
        if logits.shape() != labels.shape() {
            bail!(NetError::ShapeMismatch(format!(
                "logits {:?} and labels {:?} must have the same shape",
                logits.shape(),
                labels.shape()
            )))
        }
        Ok(logits
            .outer_iter()
            .zip(labels.outer_iter())
            .map(|(row, target)| {
                let lse = logsumexp(row);
                target.iter().zip(row.iter()).map(|(&t, &x)| t * (lse - x)).sum::<f32>()
            })
            .collect())
    }
}

impl Op for SoftmaxCrossEntropy {
    fn name(&self) -> Cow<str> {
        "SoftmaxCrossEntropy".into()
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let (logits, labels) = args_2!(inputs);
        check_batch(&logits.shape, &labels.shape)?;
        if logits.shape != labels.shape {
            bail!(NetError::ShapeMismatch(format!(
                "logits {logits:?} and labels {labels:?} must have the same shape"
            )))
        }
        Ok(tvec!(TypedFact::f32([logits.shape[0]])))
    }
}

fn batch_mean(losses: Array1<f32>) -> NetResult<f32> {
    losses.mean().ok_or_else(|| {
        anyhow!(NetError::ShapeMismatch("can not average a loss over an empty batch".into()))
    })
}

/// Mean over the batch of the sparse softmax cross-entropy.
pub fn sparse_softmax_cross_entropy_loss(
    logits: ArrayView2<f32>,
    labels: ArrayView1<i64>,
) -> NetResult<f32> {
    batch_mean(SparseSoftmaxCrossEntropy.eval(logits, labels)?)
}

/// Mean over the batch of the dense-label softmax cross-entropy.
pub fn softmax_cross_entropy_loss(
    logits: ArrayView2<f32>,
    labels: ArrayView2<f32>,
) -> NetResult<f32> {
    batch_mean(SoftmaxCrossEntropy.eval(logits, labels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_logits() {
        let logits = Array2::<f32>::zeros((4, 10));
        let labels = arr1(&[0i64, 3, 9, 1]);
        let loss = sparse_softmax_cross_entropy_loss(logits.view(), labels.view()).unwrap();
        assert_abs_diff_eq!(loss, 10f32.ln(), epsilon = 1e-6);
    }

    #[test]
    fn confident_and_wrong() {
        let logits = arr2(&[[10f32, 0.0], [0.0, 10.0]]);
        let losses =
            SparseSoftmaxCrossEntropy.eval(logits.view(), arr1(&[0i64, 0]).view()).unwrap();
        assert_abs_diff_eq!(losses[0], (1.0 + (-10f32).exp()).ln(), epsilon = 1e-6);
        assert_abs_diff_eq!(losses[1], 10.0 + (1.0 + (-10f32).exp()).ln(), epsilon = 1e-4);
    }

    #[test]
    fn large_logits_stay_finite() {
        let logits = arr2(&[[1000f32, -1000.0, 0.0]]);
        let loss = sparse_softmax_cross_entropy_loss(logits.view(), arr1(&[1i64]).view()).unwrap();
        assert!(loss.is_finite());
        assert_abs_diff_eq!(loss, 2000.0, epsilon = 1e-2);
    }

    #[test]
    fn batch_mismatch() {
        let logits = Array2::<f32>::zeros((8, 10));
        let labels = Array1::<i64>::zeros(4);
        let e = sparse_softmax_cross_entropy_loss(logits.view(), labels.view()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
    }

    #[test]
    fn label_out_of_range() {
        let logits = Array2::<f32>::zeros((1, 10));
        let e = sparse_softmax_cross_entropy_loss(logits.view(), arr1(&[10i64]).view())
            .unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::InvalidParameter(_))));
    }

    #[test]
    fn dense_labels_match_sparse() {
        let logits = arr2(&[[0.5f32, 1.5, -0.3], [2.0, 0.1, 0.2]]);
        let one_hot = arr2(&[[0f32, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let dense = softmax_cross_entropy_loss(logits.view(), one_hot.view()).unwrap();
        let sparse =
            sparse_softmax_cross_entropy_loss(logits.view(), arr1(&[1i64, 2]).view()).unwrap();
        assert_abs_diff_eq!(dense, sparse, epsilon = 1e-6);
    }

    #[test]
    fn facts() {
        let op = SparseSoftmaxCrossEntropy;
        let facts =
            op.output_facts(&[&TypedFact::f32([8, 1000]), &TypedFact::i64([8])]).unwrap();
        assert_eq!(facts[0], TypedFact::f32([8]));
        let e = op.output_facts(&[&TypedFact::f32([8, 1000]), &TypedFact::i64([4])]).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
    }
}
