use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use rust_convt_shape::{
    ConvTransposeParam, DataType, OpError, StandardPolicy, TensorDesc, conv_output_size,
    infer_conv_transpose_shape,
};

/// One spatial axis: (input, kernel, stride, padding, dilation), with the
/// padding kept small enough that the output extent stays positive.
fn axis() -> impl Strategy<Value = (i64, i64, i64, i64, i64)> {
    (1i64..32, 1i64..8, 1i64..5, 1i64..4).prop_flat_map(|(input, kernel, stride, dilation)| {
        let effective_kernel = dilation * (kernel - 1) + 1;
        let grown = (input - 1) * stride + effective_kernel;
        let max_padding = (grown - 1) / 2;
        (0..=max_padding).prop_map(move |padding| (input, kernel, stride, padding, dilation))
    })
}

fn build(
    batch: i64,
    in_channels: i64,
    out_per_group: i64,
    groups: i64,
    axes: &[(i64, i64, i64, i64, i64)],
) -> ConvTransposeParam {
    let mut input = vec![batch, in_channels];
    let mut filter = vec![in_channels, out_per_group];
    input.extend(axes.iter().map(|a| a.0));
    filter.extend(axes.iter().map(|a| a.1));
    ConvTransposeParam::new(
        TensorDesc::new(DataType::Float32, input),
        TensorDesc::new(DataType::Float32, filter),
        TensorDesc::new(DataType::Float32, vec![]),
        axes.iter().map(|a| a.2).collect(),
        axes.iter().map(|a| a.3).collect(),
        axes.iter().map(|a| a.4).collect(),
        groups,
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn unit_stride_grows_by_kernel_minus_one(
        batch in 1i64..8,
        channels in 1i64..16,
        out_channels in 1i64..16,
        h in 1i64..64,
        w in 1i64..64,
        kh in 1i64..8,
        kw in 1i64..8,
    ) {
        let mut param = build(batch, channels, out_channels, 1, &[(h, kh, 1, 0, 1), (w, kw, 1, 0, 1)]);
        infer_conv_transpose_shape(&mut param, &StandardPolicy).expect("unit stride configuration is valid");
        prop_assert_eq!(param.output().dims(), &[batch, out_channels, h + kh - 1, w + kw - 1][..]);
    }

    #[test]
    fn batch_and_channels_follow_the_filter(
        batch in 1i64..16,
        channels in 1i64..16,
        out_per_group in 1i64..16,
        groups in 1i64..8,
        axes in proptest::collection::vec(axis(), 2..=3),
    ) {
        let mut param = build(batch, channels, out_per_group, groups, &axes);
        infer_conv_transpose_shape(&mut param, &StandardPolicy).expect("generated configuration is valid");
        let dims = param.output().dims();
        prop_assert_eq!(dims.len(), axes.len() + 2);
        prop_assert_eq!(dims[0], batch);
        prop_assert_eq!(dims[1], out_per_group * groups);
    }

    #[test]
    fn forward_convolution_recovers_the_input_extent(
        axes in proptest::collection::vec(axis(), 2..=3),
    ) {
        let mut param = build(1, 3, 2, 1, &axes);
        infer_conv_transpose_shape(&mut param, &StandardPolicy).expect("generated configuration is valid");
        for (i, &(input, kernel, stride, padding, dilation)) in axes.iter().enumerate() {
            let output = param.output().dims()[i + 2];
            prop_assert!(output > 0);
            prop_assert_eq!(conv_output_size(output, kernel, stride, padding, dilation), Some(input));
        }
    }

    #[test]
    fn inference_is_idempotent(
        groups in 1i64..4,
        axes in proptest::collection::vec(axis(), 2..=3),
    ) {
        let mut param = build(2, 4, 3, groups, &axes);
        infer_conv_transpose_shape(&mut param, &StandardPolicy).expect("generated configuration is valid");
        let first = param.output().clone();
        infer_conv_transpose_shape(&mut param, &StandardPolicy).expect("second inference is valid");
        prop_assert_eq!(param.output(), &first);
    }

    #[test]
    fn unsupported_ranks_fail_without_writing(
        rank in prop_oneof![Just(1usize), Just(2), Just(3), Just(6), Just(7)],
        extent in 1i64..8,
    ) {
        let spatial = vec![1i64; rank.saturating_sub(2)];
        let mut param = ConvTransposeParam::new(
            TensorDesc::new(DataType::Float32, vec![extent; rank]),
            TensorDesc::new(DataType::Float32, vec![extent; rank]),
            TensorDesc::new(DataType::Float32, vec![3, 3]),
            spatial.clone(),
            spatial.iter().map(|_| 0).collect(),
            spatial,
            1,
        );
        let err = infer_conv_transpose_shape(&mut param, &StandardPolicy).unwrap_err();
        prop_assert!(matches!(err, OpError::RankMismatch { .. }), "got {:?}", err);
        prop_assert_eq!(param.output().dims(), &[3, 3][..]);
    }

    #[test]
    fn channel_mismatch_fails_without_writing(
        channels in 1i64..32,
        delta in 1i64..8,
        axes in proptest::collection::vec(axis(), 2..=2),
    ) {
        let param = build(1, channels, 2, 1, &axes);
        let mut filter = param.filter().dims().to_vec();
        filter[0] = channels + delta;
        let mut param = ConvTransposeParam::new(
            param.input().clone(),
            TensorDesc::new(DataType::Float32, filter),
            param.output().clone(),
            param.strides().to_vec(),
            param.paddings().to_vec(),
            param.dilations().to_vec(),
            1,
        );
        let err = infer_conv_transpose_shape(&mut param, &StandardPolicy).unwrap_err();
        prop_assert!(
            matches!(err, OpError::ChannelMismatch { input_channels, filter_channels }
                if input_channels == channels && filter_channels == channels + delta),
            "got {:?}",
            err
        );
        prop_assert!(param.output().dims().is_empty());
    }
}
