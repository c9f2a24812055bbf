//! Inception v4, "Inception-v4, Inception-ResNet and the Impact of Residual
//! Connections on Learning".
use convnet_core::prelude::*;

use crate::columns::*;

fn inception_v4_a(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![apool(3, 3, 1, 1, SAME), conv(96, 1, 1)],
        vec![conv(96, 1, 1)],
        vec![conv(64, 1, 1), conv(96, 3, 3)],
        vec![conv(64, 1, 1), conv(96, 3, 3), conv(96, 3, 3)],
    ];
    cnn.inception_module("incept_v4_a", &cols.into())
}

fn inception_v4_b(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![apool(3, 3, 1, 1, SAME), conv(128, 1, 1)],
        vec![conv(384, 1, 1)],
        vec![conv(192, 1, 1), conv(224, 1, 7), conv(256, 7, 1)],
        vec![conv(192, 1, 1), conv(192, 1, 7), conv(224, 7, 1), conv(224, 1, 7), conv(256, 7, 1)],
    ];
    cnn.inception_module("incept_v4_b", &cols.into())
}

fn inception_v4_c(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![apool(3, 3, 1, 1, SAME), conv(256, 1, 1)],
        vec![conv(256, 1, 1)],
        vec![conv(384, 1, 1), conv(256, 1, 3)],
        vec![SHARE, conv(256, 3, 1)],
        vec![conv(384, 1, 1), conv(448, 1, 3), conv(512, 3, 1), conv(256, 3, 1)],
        vec![SHARE, SHARE, SHARE, conv(256, 1, 3)],
    ];
    cnn.inception_module("incept_v4_c", &cols.into())
}

// Stem
fn inception_v4_sa(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![vec![mpool(3, 3, 2, 2, VALID)], vec![conv_s(96, 3, 3, 2, 2, VALID)]];
    cnn.inception_module("incept_v4_sa", &cols.into())
}

fn inception_v4_sb(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![conv(64, 1, 1), conv_s(96, 3, 3, 1, 1, VALID)],
        vec![conv(64, 1, 1), conv(64, 7, 1), conv(64, 1, 7), conv_s(96, 3, 3, 1, 1, VALID)],
    ];
    cnn.inception_module("incept_v4_sb", &cols.into())
}

fn inception_v4_sc(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![vec![conv_s(192, 3, 3, 2, 2, VALID)], vec![mpool(3, 3, 2, 2, VALID)]];
    cnn.inception_module("incept_v4_sc", &cols.into())
}

// Reductions
fn inception_v4_ra(
    cnn: &mut ConvNetBuilder,
    k: usize,
    l: usize,
    m: usize,
    n: usize,
) -> NetResult<OutletId> {
    let cols = vec![
        vec![mpool(3, 3, 2, 2, VALID)],
        vec![conv_s(n, 3, 3, 2, 2, VALID)],
        vec![conv(k, 1, 1), conv(l, 3, 3), conv_s(m, 3, 3, 2, 2, VALID)],
    ];
    cnn.inception_module("incept_v4_ra", &cols.into())
}

fn inception_v4_rb(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![mpool(3, 3, 2, 2, VALID)],
        vec![conv(192, 1, 1), conv_s(192, 3, 3, 2, 2, VALID)],
        vec![conv(256, 1, 1), conv(256, 1, 7), conv(320, 7, 1), conv_s(320, 3, 3, 2, 2, VALID)],
    ];
    cnn.inception_module("incept_v4_rb", &cols.into())
}

pub(crate) fn build(cnn: &mut ConvNetBuilder) -> NetResult<()> {
    cnn.conv(32, [3, 3], [2, 2], VALID)?;
    cnn.conv(32, [3, 3], [1, 1], VALID)?;
    cnn.conv(64, [3, 3], [1, 1], SAME)?;
    inception_v4_sa(cnn)?;
    inception_v4_sb(cnn)?;
    inception_v4_sc(cnn)?;
    for _ in 0..4 {
        inception_v4_a(cnn)?;
    }
    inception_v4_ra(cnn, 192, 224, 256, 384)?;
    for _ in 0..7 {
        inception_v4_b(cnn)?;
    }
    inception_v4_rb(cnn)?;
    for _ in 0..3 {
        inception_v4_c(cnn)?;
    }
    cnn.spatial_mean()?;
    cnn.dropout(0.8)?;
    Ok(())
}
