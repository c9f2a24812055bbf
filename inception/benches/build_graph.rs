#[macro_use]
extern crate criterion;
use criterion::Criterion;

use convnet_inception::prelude::*;

fn build(c: &mut Criterion, model: &str, data_format: DataFormat) {
    let config = InceptionConfig::default().with_data_format(data_format).with_auxiliary(true);
    let inception = Inception::new(model, config).unwrap();
    let images = inception.image_fact();
    c.bench_function(&format!("{model} {data_format:?}"), |b| {
        b.iter(|| inception.inference(&images).unwrap())
    });
}

fn inception(c: &mut Criterion) {
    build(c, "inception3", DataFormat::NHWC);
    build(c, "inception3", DataFormat::NCHW);
    build(c, "inception4", DataFormat::NHWC);
}

fn module(c: &mut Criterion) {
    let spec: BranchSpec = "conv(320,1,1); conv(384,1,1) > conv(384,1,3); share > conv(384,3,1); \
        conv(448,1,1) > conv(384,3,3) > conv(384,1,3); share > share > conv(384,3,1); \
        apool(3,3,1,1,SAME) > conv(192,1,1)"
        .parse()
        .unwrap();
    c.bench_function("incept_v3_e", |b| {
        b.iter(|| {
            let mut cnn =
                ConvNetBuilder::new(TypedFact::f32([32, 8, 8, 1280]), DataFormat::NHWC).unwrap();
            cnn.inception_module("incept_v3_e", &spec).unwrap()
        })
    });
}

criterion_group!(benches, inception, module);
criterion_main!(benches);
