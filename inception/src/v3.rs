//! Inception v3, "Rethinking the Inception Architecture for Computer Vision".
use convnet_core::prelude::*;

use crate::columns::*;

fn inception_v3_a(cnn: &mut ConvNetBuilder, n: usize) -> NetResult<OutletId> {
    let cols = vec![
        vec![conv(64, 1, 1)],
        vec![conv(48, 1, 1), conv(64, 5, 5)],
        vec![conv(64, 1, 1), conv(96, 3, 3), conv(96, 3, 3)],
        vec![apool(3, 3, 1, 1, SAME), conv(n, 1, 1)],
    ];
    cnn.inception_module("incept_v3_a", &cols.into())
}

fn inception_v3_b(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![conv_s(384, 3, 3, 2, 2, VALID)],
        vec![conv(64, 1, 1), conv(96, 3, 3), conv_s(96, 3, 3, 2, 2, VALID)],
        vec![mpool(3, 3, 2, 2, VALID)],
    ];
    cnn.inception_module("incept_v3_b", &cols.into())
}

fn inception_v3_c(cnn: &mut ConvNetBuilder, n: usize) -> NetResult<OutletId> {
    let cols = vec![
        vec![conv(192, 1, 1)],
        vec![conv(n, 1, 1), conv(n, 1, 7), conv(192, 7, 1)],
        vec![conv(n, 1, 1), conv(n, 7, 1), conv(n, 1, 7), conv(n, 7, 1), conv(192, 1, 7)],
        vec![apool(3, 3, 1, 1, SAME), conv(192, 1, 1)],
    ];
    cnn.inception_module("incept_v3_c", &cols.into())
}

fn inception_v3_d(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    let cols = vec![
        vec![conv(192, 1, 1), conv_s(320, 3, 3, 2, 2, VALID)],
        vec![conv(192, 1, 1), conv(192, 1, 7), conv(192, 7, 1), conv_s(192, 3, 3, 2, 2, VALID)],
        vec![mpool(3, 3, 2, 2, VALID)],
    ];
    cnn.inception_module("incept_v3_d", &cols.into())
}

fn inception_v3_e(cnn: &mut ConvNetBuilder, max_pool: bool) -> NetResult<OutletId> {
    let pool = if max_pool { mpool(3, 3, 1, 1, SAME) } else { apool(3, 3, 1, 1, SAME) };
    let cols = vec![
        vec![conv(320, 1, 1)],
        vec![conv(384, 1, 1), conv(384, 1, 3)],
        vec![SHARE, conv(384, 3, 1)],
        vec![conv(448, 1, 1), conv(384, 3, 3), conv(384, 1, 3)],
        vec![SHARE, SHARE, conv(384, 3, 1)],
        vec![pool, conv(192, 1, 1)],
    ];
    cnn.inception_module("incept_v3_e", &cols.into())
}

/// Auxiliary classifier head, on top of the 17x17x768 grid.
fn incept_v3_aux(cnn: &mut ConvNetBuilder) -> NetResult<OutletId> {
    cnn.with_auxiliary(|cnn| {
        cnn.avg_pool([5, 5], [3, 3], VALID)?;
        cnn.conv(128, [1, 1], [1, 1], SAME)?;
        cnn.conv(768, [5, 5], [1, 1], VALID)?;
        let batch = cnn.batch_size()? as isize;
        cnn.reshape(&[batch, 768])?;
        Ok(())
    })
}

pub(crate) fn build(cnn: &mut ConvNetBuilder, auxiliary: bool) -> NetResult<()> {
    cnn.conv(32, [3, 3], [2, 2], VALID)?; // 299 x 299 x 3
    cnn.conv(32, [3, 3], [1, 1], VALID)?; // 149 x 149 x 32
    cnn.conv(64, [3, 3], [1, 1], SAME)?; // 147 x 147 x 64
    cnn.max_pool([3, 3], [2, 2], VALID)?; // 147 x 147 x 64
    cnn.conv(80, [1, 1], [1, 1], VALID)?; // 73 x 73 x 80
    cnn.conv(192, [3, 3], [1, 1], VALID)?; // 71 x 71 x 192
    cnn.max_pool([3, 3], [2, 2], VALID)?; // 35 x 35 x 192
    inception_v3_a(cnn, 32)?; // 35 x 35 x 256 mixed
    inception_v3_a(cnn, 64)?; // 35 x 35 x 288 mixed_1
    inception_v3_a(cnn, 64)?; // 35 x 35 x 288 mixed_2
    inception_v3_b(cnn)?; // 17 x 17 x 768 mixed_3
    inception_v3_c(cnn, 128)?; // 17 x 17 x 768 mixed_4
    inception_v3_c(cnn, 160)?; // 17 x 17 x 768 mixed_5
    inception_v3_c(cnn, 160)?; // 17 x 17 x 768 mixed_6
    inception_v3_c(cnn, 192)?; // 17 x 17 x 768 mixed_7
    if auxiliary {
        incept_v3_aux(cnn)?;
    }
    inception_v3_d(cnn)?; // 8 x 8 x 1280 mixed_8
    inception_v3_e(cnn, false)?; // 8 x 8 x 2048 mixed_9
    inception_v3_e(cnn, true)?; // 8 x 8 x 2048 mixed_10
    cnn.avg_pool([8, 8], [1, 1], VALID)?; // 1 x 1 x 2048
    // an explicit batch rejects grids left bigger than 1x1
    let batch = cnn.batch_size()? as isize;
    cnn.reshape(&[batch, 2048])?;
    Ok(())
}
