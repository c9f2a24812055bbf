use convnet_core::prelude::*;
use proptest::prelude::*;

const INPUT_CHANNELS: usize = 16;

fn op() -> impl Strategy<Value = OpDesc> {
    prop_oneof![
        (1usize..64, prop::sample::select(vec![1usize, 3, 5]))
            .prop_map(|(n, k)| OpDesc::conv(n, k, k)),
        (1usize..64, 1usize..4).prop_map(|(n, k)| OpDesc::conv(n, 1, 2 * k + 1)),
        Just(OpDesc::mpool(3, 3, 1, 1, PaddingSpec::Same)),
        Just(OpDesc::apool(3, 3, 1, 1, PaddingSpec::Same)),
    ]
}

fn spec() -> impl Strategy<Value = BranchSpec> {
    prop::collection::vec(prop::collection::vec(op(), 1..4), 1..5).prop_map(BranchSpec::from)
}

fn channels(column: &[OpDesc]) -> usize {
    column.iter().fold(INPUT_CHANNELS, |c, op| match op {
        OpDesc::Conv(d) => d.num_out_channels,
        _ => c,
    })
}

fn builder() -> ConvNetBuilder {
    ConvNetBuilder::new(TypedFact::f32([2, 9, 9, INPUT_CHANNELS]), DataFormat::NHWC).unwrap()
}

proptest! {
    #[test]
    fn output_channels_are_the_column_sum(spec in spec()) {
        let mut cnn = builder();
        cnn.inception_module("module", &spec).unwrap();
        let expected: usize = spec.columns.iter().map(|c| channels(c)).sum();
        prop_assert_eq!(cnn.top_size(), expected);
        prop_assert_eq!(cnn.top_fact().unwrap(), &TypedFact::f32([2, 9, 9, expected]));
    }

    #[test]
    fn shared_prefix_is_wired_once(spec in spec(), shared in 1usize..3) {
        let mut columns = spec.columns.clone();
        let first = columns[0].clone();
        let shared = shared.min(first.len());
        let mut column = vec![OpDesc::Share; shared];
        column.extend(first.iter().skip(shared).cloned());
        column.push(OpDesc::conv(7, 1, 1));
        columns.insert(1, column);
        let with_share = BranchSpec::from(columns);

        let mut plain = builder();
        plain.inception_module("module", &spec).unwrap();
        let mut cnn = builder();
        cnn.inception_module("module", &with_share).unwrap();
        // conv and relu per conv, one node per pool
        let nodes = |ops: &[OpDesc]| {
            ops.iter().map(|op| if matches!(op, OpDesc::Conv(_)) { 2 } else { 1 }).sum::<usize>()
        };
        let added = nodes(&first[shared..]) + 2;
        prop_assert_eq!(cnn.model().nodes_len(), plain.model().nodes_len() + added);
        prop_assert_eq!(cnn.top_size(), plain.top_size() + 7);
    }
}

#[test]
fn failed_module_leaves_builder_untouched() {
    let mut cnn = builder();
    let before = (cnn.top(), cnn.top_size(), cnn.model().nodes_len());
    let spec: BranchSpec = "conv(8,1,1); conv(8,3,3,2,2,VALID)".parse().unwrap();
    let e = cnn.inception_module("broken", &spec).unwrap_err();
    assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
    assert_eq!((cnn.top(), cnn.top_size(), cnn.model().nodes_len()), before);
    // names are not burnt by the failed attempt
    cnn.inception_module("broken", &"conv(8,1,1)".parse().unwrap()).unwrap();
    assert!(cnn.model().node_by_name("broken0/concat").is_ok());
}
