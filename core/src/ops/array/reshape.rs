use crate::internal::*;

/// Reshape to a target shape where at most one dimension may be `-1`, to be
/// inferred from the element count.
#[derive(Debug, Clone, new)]
pub struct Reshape {
    pub shape: TVec<isize>,
}

impl Reshape {
    pub fn compute_shape(&self, input: &[usize]) -> NetResult<TVec<usize>> {
        let volume: usize = input.iter().product();
        let wildcards = self.shape.iter().filter(|&&d| d == -1).count();
        if wildcards > 1 || self.shape.iter().any(|&d| d < -1) {
            bail!(NetError::InvalidParameter(format!("Invalid reshape target {:?}", self.shape)))
        }
        let known: usize = self.shape.iter().filter(|&&d| d >= 0).map(|&d| d as usize).product();
        let shape: TVec<usize> = if wildcards == 1 {
            if known == 0 || volume % known != 0 {
                bail!(NetError::ShapeMismatch(format!(
                    "Can not reshape {input:?} to {:?}",
                    self.shape
                )))
            }
            self.shape.iter().map(|&d| if d == -1 { volume / known } else { d as usize }).collect()
        } else {
            self.shape.iter().map(|&d| d as usize).collect()
        };
        if shape.iter().product::<usize>() != volume {
            bail!(NetError::ShapeMismatch(format!("Can not reshape {input:?} to {:?}", self.shape)))
        }
        Ok(shape)
    }
}

impl Op for Reshape {
    fn name(&self) -> Cow<str> {
        "Reshape".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!("to: {:?}", self.shape)])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        Ok(tvec!(TypedFact::dt_shape(input.datum_type, self.compute_shape(&input.shape)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard() {
        let op = Reshape::new(tvec!(-1, 2048));
        assert_eq!(op.compute_shape(&[32, 1, 1, 2048]).unwrap().as_slice(), &[32, 2048]);
        assert_eq!(op.compute_shape(&[3, 2048]).unwrap().as_slice(), &[3, 2048]);
    }

    #[test]
    fn explicit() {
        let op = Reshape::new(tvec!(4, 6));
        assert_eq!(op.compute_shape(&[2, 3, 4]).unwrap().as_slice(), &[4, 6]);
    }

    #[test]
    fn volume_mismatch() {
        let e = Reshape::new(tvec!(-1, 768)).compute_shape(&[8, 2, 2, 100]).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
        let e = Reshape::new(tvec!(5, 5)).compute_shape(&[8]).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
    }

    #[test]
    fn two_wildcards() {
        let e = Reshape::new(tvec!(-1, -1)).compute_shape(&[8]).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::InvalidParameter(_))));
    }
}
