//! Crate-level scenario and property checks across the public surface.

use crate::{
    fft_forward_complex, fft_forward_real, fft_inverse_complex, fft_inverse_real, ComplexSeq,
    DefaultRandom, FftPlan, GaussianSource, IntSeq, RandomSource, RealSeq, RealVector, Sequence,
};
use num_complex::Complex64;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn deterministic_reals(n: usize, seed: u64) -> Vec<f64> {
    let mut src = DefaultRandom::with_seed(seed);
    (0..n).map(|_| src.next_double() * 8.0 - 4.0).collect()
}

//
// End-to-end scenarios.
//

#[test]
fn integer_range_reductions() {
    let mut r = IntSeq::range(1, 10);
    assert_eq!(r.sum(), 55);
    assert_eq!(r.product(), 3_628_800);
    assert_eq!(r.index(3).unwrap(), 4);
}

#[test]
fn real_grid_materialization_and_order() {
    let mut g = RealSeq::grid(0.0, 4, 1.0);
    assert_eq!(g.materialize(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(RealSeq::grid(0.0, 4, 1.0).sort_desc().first(), 1.0);
}

#[test]
fn even_square_sum_over_a_large_range() {
    let total = IntSeq::range(1, 1000)
        .filter(|x| x % 2 == 0)
        .map(|x| x * x)
        .sum();
    assert_eq!(total, 166_666_500_000);
}

#[test]
fn repeat_product_and_distinct() {
    assert_eq!(IntSeq::repeat(5, 3).product(), 243);
    let mut d = IntSeq::repeat(5, 3).distinct();
    assert_eq!(d.materialize(), vec![3]);

    let mut d = ComplexSeq::repeat(5, c(3.0, 0.0)).distinct();
    assert_eq!(d.materialize(), vec![c(3.0, 0.0)]);
}

#[test]
fn real_forward_of_small_ramp_is_exact() {
    let spec = fft_forward_real(&[1.0, 2.0, 3.0, 4.0]);
    let expect = [c(10.0, 0.0), c(-2.0, 2.0), c(-2.0, 0.0), c(-2.0, -2.0)];
    for (got, want) in spec.iter().zip(&expect) {
        assert!((got - want).norm() < 1e-12);
    }
}

#[test]
fn rader_impulse_spectrum_is_flat() {
    let mut a = vec![Complex64::default(); 7];
    a[0] = c(1.0, 0.0);
    fft_forward_complex(&mut a);
    for bin in a {
        assert!((bin - c(1.0, 0.0)).norm() < 1e-10);
    }
}

#[test]
fn bluestein_impulse_spectrum_is_flat() {
    let mut a = vec![Complex64::default(); 23];
    a[0] = c(1.0, 0.0);
    fft_forward_complex(&mut a);
    for bin in a {
        assert!((bin - c(1.0, 0.0)).norm() < 1e-10);
    }
}

#[test]
fn plan_descriptions_name_their_strategies() {
    init_logs();
    let tree = FftPlan::new(360).unwrap().describe();
    assert!(tree.contains("Codelet-5"));
    assert!(tree.contains("Codelet-3"));
    assert!(tree.contains("Codelet-2"));

    assert!(FftPlan::new(23).unwrap().describe().contains("Bluestein"));
    assert!(FftPlan::new(17).unwrap().describe().contains("Rader"));
}

#[test]
fn range_closed_form_sum() {
    for (a, b) in [(1, 10), (3, 99), (-5, 5), (0, 0)] {
        let analytic = RealSeq::range(a, b).sum();
        let mut iterated = 0.0;
        let mut s = RealSeq::range(a, b);
        while let Some(x) = s.next() {
            iterated += x;
        }
        assert_eq!(analytic, iterated, "range({}, {})", a, b);
    }
}

#[test]
fn dc_bin_is_the_sum_of_inputs() {
    let x: Vec<f64> = (0..40).map(|i| (i as f64).sin() * 3.0).collect();
    let spec = fft_forward_real(&x);
    let sum: f64 = x.iter().sum();
    assert!((spec[0].re - sum).abs() < 1e-10);
    assert!(spec[0].im.abs() < 1e-10);
}

#[test]
fn sequence_fft_bridges_the_subsystems() {
    // A pure cosine concentrates its energy in one presented bin.
    let n = 64;
    let seq = RealSeq::unfold_indexed(n, 1.0, |i, _| {
        (2.0 * std::f64::consts::PI * 4.0 * i as f64 / 64.0).cos()
    });
    let spectrum = seq.clone().fft();
    let mags = spectrum.magnitudes();
    assert_eq!(mags.len(), 33);
    let peak = mags
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, 4);

    let back = spectrum.inverse_real().unwrap();
    let original = seq.clone().materialize();
    for i in 0..n {
        assert!((back[i] - original[i]).abs() < 1e-9);
    }
}

#[test]
fn zip_truncates_instead_of_failing() {
    let mut z = RealSeq::range(1, 3).zip(RealSeq::grid(0.0, 9, 9.0), |a, b| a + b);
    assert_eq!(z.materialize().len(), 3);
}

#[test]
fn spectra_of_complex_sequences_are_full_range() {
    let spec = ComplexSeq::repeat(12, c(1.0, -1.0)).fft();
    assert_eq!(spec.len(), 12);
    assert!((spec.get(0).unwrap() - c(12.0, -12.0)).norm() < 1e-10);
}

//
// Sequence invariants.
//

#[test]
fn map_fusion_yields_the_same_stream() {
    let base = || RealSeq::from_values(vec![1.5, -2.0, 0.25, 7.0]);
    let mut fused = base().map(|x| x + 1.0).map(|x| x * x);
    let mut direct = base().map(|x| (x + 1.0) * (x + 1.0));
    assert!(fused.has_length());
    assert_eq!(fused.length(), direct.length());
    assert_eq!(fused.materialize(), direct.materialize());
}

#[test]
fn filter_map_fusion_yields_the_same_stream() {
    let fused = RealSeq::range(1, 50)
        .filter(|x| x % 3.0 == 0.0)
        .map(|x| x * 2.0);
    assert!(matches!(fused, RealSeq::FilteredMapped { .. }));
    let mut fused = fused;
    let expect: Vec<f64> = (1..=50)
        .map(|k| k as f64)
        .filter(|x| x % 3.0 == 0.0)
        .map(|x| x * 2.0)
        .collect();
    assert_eq!(fused.materialize(), expect);
}

#[test]
fn reset_is_idempotent_across_variants() {
    let mut candidates: Vec<RealSeq> = vec![
        RealSeq::range(2, 9),
        RealSeq::grid(-1.0, 7, 1.0),
        RealSeq::repeat(5, 3.25),
        RealSeq::from_values(vec![4.0, 5.0, 6.0]),
        RealSeq::unfold(6, 2.0, |x| x * 1.5),
        RealSeq::unfold2(7, 0.0, 1.0, |a, b| a + b),
        RealSeq::range(1, 20).filter(|x| x % 2.0 == 1.0),
        RealSeq::range(1, 8).map(|x| x - 4.0),
        RealSeq::range(1, 8).zip(RealSeq::grid(0.0, 7, 1.0), |a, b| a * b),
        RealSeq::grid(0.0, 9, 9.0).take_while(|x| x < 6.5),
        RealSeq::grid(0.0, 9, 9.0).until_value(4.0),
    ];
    for s in candidates.iter_mut() {
        let canonical = s.clone().materialize();
        s.next();
        s.next();
        s.reset();
        let mut replayed = Vec::new();
        while let Some(x) = s.next() {
            replayed.push(x);
        }
        assert_eq!(replayed, canonical);
    }
}

#[test]
fn materialize_matches_successive_next_values() {
    let builders: Vec<fn() -> RealSeq> = vec![
        || RealSeq::range(1, 17),
        || RealSeq::grid(0.0, 12, 3.0),
        || RealSeq::repeat(9, -2.0),
        || RealSeq::range(1, 30).map(|x| 1.0 / x),
        || RealSeq::range(1, 5).zip(RealSeq::range(10, 20), |a, b| b - a),
    ];
    for build in builders {
        let mut s = build();
        assert!(s.has_length());
        let n = s.length();
        let stored = s.materialize();
        assert_eq!(stored.len(), n);

        let mut t = build();
        let mut streamed = Vec::new();
        while let Some(x) = t.next() {
            streamed.push(x);
        }
        assert_eq!(stored, streamed);
    }
}

#[test]
fn range_sum_closed_form_against_formula() {
    for (a, b) in [(1i64, 10i64), (4, 200), (-7, 13)] {
        let expect = (b * (b + 1) - a * (a - 1)) / 2;
        assert_eq!(
            RealSeq::range(a as i32, b as i32).sum(),
            expect as f64,
            "range({}, {})",
            a,
            b
        );
        assert_eq!(IntSeq::range(a as i32, b as i32).sum(), expect);
    }
}

#[test]
fn elementwise_sum_distributes() {
    let x = deterministic_reals(64, 11);
    let y = deterministic_reals(64, 23);
    let s1 = RealSeq::from_values(x.clone());
    let s2 = RealSeq::from_values(y.clone());
    let joint = (s1.clone() + s2.clone()).sum();
    let split = s1.clone().sum() + s2.clone().sum();
    assert!((joint - split).abs() < 1e-9);

    let lazy1 = RealSeq::grid(0.0, 99, 1.0);
    let lazy2 = RealSeq::range(1, 100);
    let joint = (lazy1.clone() + lazy2.clone()).sum();
    let split = lazy1.clone().sum() + lazy2.clone().sum();
    assert!((joint - split).abs() < 1e-9);
}

#[test]
fn clone_then_reset_is_a_fresh_cursor() {
    let mut s = RealSeq::unfold(10, 1.0, |x| x + 3.0);
    s.next();
    s.next();
    let mut copy = s.clone();
    copy.reset();
    assert_eq!(copy.next(), Some(1.0));
    // The original keeps its own cursor.
    assert_eq!(s.next(), Some(7.0));
}

#[test]
fn int_and_complex_fusion_match_real_behavior() {
    let mut fused = IntSeq::range(1, 12).map(|x| x + 1).map(|x| x * 3);
    let mut direct = IntSeq::range(1, 12).map(|x| (x + 1) * 3);
    assert_eq!(fused.materialize(), direct.materialize());

    let mut fused = ComplexSeq::grid(c(0.0, 0.0), 5, c(1.0, 1.0))
        .map(|z| z * c(2.0, 0.0))
        .map(|z| z + c(0.0, 1.0));
    let mut direct =
        ComplexSeq::grid(c(0.0, 0.0), 5, c(1.0, 1.0)).map(|z| z * c(2.0, 0.0) + c(0.0, 1.0));
    let (a, b) = (fused.materialize(), direct.materialize());
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).norm() < 1e-12);
    }
}

#[test]
fn seeded_random_sequences_have_exact_lengths() {
    let mut u = RealSeq::random_with(100, Box::new(DefaultRandom::with_seed(1)));
    assert!(u.has_length());
    assert_eq!(u.length(), 100);
    assert_eq!(u.materialize().len(), 100);

    let coeffs = RealVector::new(vec![0.5, -0.25]);
    let mut ar =
        RealSeq::ar_with(64, &coeffs, Box::new(GaussianSource::with_seed(1.0, 2))).unwrap();
    assert_eq!(ar.materialize().len(), 64);

    let mut ma =
        RealSeq::ma_with(64, 1.0, &coeffs, Box::new(GaussianSource::with_seed(1.0, 3))).unwrap();
    assert_eq!(ma.materialize().len(), 64);
}

//
// FFT invariants.
//

#[test]
fn real_roundtrip_across_a_length_sweep() {
    // Every length class: codelet, composite, prime Rader, prime
    // Bluestein, smooth, highly factored, past the recursive threshold.
    let lengths = [
        1usize, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16, 17, 18, 19, 20, 23, 25, 27, 29, 31,
        36, 45, 49, 60, 64, 81, 97, 100, 121, 125, 128, 210, 243, 256, 359, 360, 500, 625, 729,
        999, 1000, 1024, 1025, 2048, 2310,
    ];
    for &n in &lengths {
        let x = deterministic_reals(n, n as u64);
        let back = fft_inverse_real(&fft_forward_real(&x), n);
        for i in 0..n {
            assert!(
                (back[i] - x[i]).abs() < 1e-9,
                "round-trip failed at n={} index {}",
                n,
                i
            );
        }
    }
}

#[test]
fn complex_roundtrip_across_a_length_sweep() {
    for n in [1usize, 3, 7, 16, 23, 29, 48, 101, 120, 343, 1021] {
        let x: Vec<Complex64> = deterministic_reals(2 * n, n as u64 + 77)
            .chunks(2)
            .map(|p| c(p[0], p[1]))
            .collect();
        let mut a = x.clone();
        fft_forward_complex(&mut a);
        fft_inverse_complex(&mut a);
        for k in 0..n {
            assert!(
                (a[k] - x[k]).norm() < 1e-10,
                "complex round-trip failed at n={} bin {}",
                n,
                k
            );
        }
    }
}

#[test]
fn forward_transform_is_linear() {
    let n = 84;
    let x = deterministic_reals(n, 5);
    let y = deterministic_reals(n, 6);
    let (alpha, beta) = (0.75, -2.5);
    let mixed: Vec<f64> = (0..n).map(|i| alpha * x[i] + beta * y[i]).collect();

    let fx = fft_forward_real(&x);
    let fy = fft_forward_real(&y);
    let fm = fft_forward_real(&mixed);
    for k in 0..n {
        let combo = fx[k] * alpha + fy[k] * beta;
        assert!((fm[k] - combo).norm() < 1e-9);
    }
}

#[test]
fn parseval_holds_across_strategies() {
    for n in [32usize, 45, 19, 23, 97, 360] {
        let x = deterministic_reals(n, n as u64 + 1);
        let spec = fft_forward_real(&x);
        let time: f64 = x.iter().map(|v| v * v).sum();
        let freq: f64 = spec.iter().map(|z| z.norm_sqr()).sum::<f64>() / n as f64;
        assert!(
            (time - freq).abs() < 1e-8 * time.abs().max(1.0),
            "parseval failed at n={}",
            n
        );
    }
}

#[test]
fn dc_bin_is_exact_for_integer_input() {
    let x: Vec<f64> = (0..35).map(|i| ((i * 7) % 13) as f64).collect();
    let spec = fft_forward_real(&x);
    let sum: f64 = x.iter().sum();
    // Integer-valued input sums exactly in doubles.
    assert!((spec[0].re - sum).abs() < 1e-9);
}

#[test]
fn shifted_impulse_has_unit_magnitude_everywhere() {
    for n in [17usize, 23, 40] {
        let mut a = vec![Complex64::default(); n];
        a[3] = c(1.0, 0.0);
        fft_forward_complex(&mut a);
        for bin in &a {
            assert!((bin.norm() - 1.0).abs() < 1e-10);
        }
    }
}
