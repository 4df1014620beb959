use candle_core::{DType, Device, Tensor};
use docrag_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // two rows, hidden dim 4; row 0 masks its second token
    let h = Tensor::from_slice(
        &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0],
        (2, 2, 4),
        &dev,
    )
    .expect("hidden");
    let mask = Tensor::from_slice(&[1u32, 0, 1, 1], (2, 2), &dev).expect("mask").to_dtype(DType::F32).expect("f32");
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).expect("pool").to_vec2().expect("vec2");

    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    for (a, b) in out[0].iter().copied().zip([1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm]) {
        assert!((a - b).abs() < 1e-5, "a={a} b={b}");
    }
    let half = 1.0f32 / 2.0f32.sqrt();
    for (a, b) in out[1].iter().copied().zip([half, half, 0.0, 0.0]) {
        assert!((a - b).abs() < 1e-5, "a={a} b={b}");
    }
}

#[test]
fn rejects_wrong_rank() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 4), DType::F32, &dev).expect("zeros");
    let mask = Tensor::ones((2, 1), DType::F32, &dev).expect("ones");
    assert!(masked_mean_l2(&h, &mask).is_err());
}
