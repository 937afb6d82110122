use chrono::{TimeZone, Utc};
use ndarray::{s, Array2, Array4};
use waterwatch::core::water_detect::{TOTAL_WATER_BAND, WATER_BAND, WATER_FILL_BAND};
use waterwatch::{DataCube, PixelResolution, WaterDetectParams, WaterDetector, WaterError};

/// Build a two-band (MNDWI, wo) cube from per-time planes
fn make_cube(mndwi: Vec<Array2<f32>>, wo: Vec<Array2<f32>>) -> DataCube {
    assert_eq!(mndwi.len(), wo.len());
    let nt = mndwi.len();
    let (height, width) = mndwi[0].dim();
    let mut data = Array4::zeros((2, nt, height, width));
    for t in 0..nt {
        data.slice_mut(s![0, t, .., ..]).assign(&mndwi[t]);
        data.slice_mut(s![1, t, .., ..]).assign(&wo[t]);
    }
    let times = (0..nt)
        .map(|i| Utc.with_ymd_and_hms(2021, 7, 1 + i as u32, 0, 0, 0).unwrap())
        .collect();
    DataCube::new(
        data,
        vec!["MNDWI".to_string(), "wo".to_string()],
        times,
        PixelResolution::new(20.0, 50.0).unwrap(),
    )
    .unwrap()
}

/// Vertical step plane: left half `lo`, right half `hi`
fn step(height: usize, width: usize, lo: f32, hi: f32) -> Array2<f32> {
    Array2::from_shape_fn(
        (height, width),
        |(_, x)| if x < width / 2 { lo } else { hi },
    )
}

fn flat(height: usize, width: usize, value: f32) -> Array2<f32> {
    Array2::from_elem((height, width), value)
}

#[test]
fn test_output_shape_and_band_names() {
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0), step(12, 12, -0.8, 0.9)],
        vec![flat(12, 12, 0.4), flat(12, 12, 0.4)],
    );
    let detector = WaterDetector::new();
    let out = detector.apply(&cube).unwrap();

    assert_eq!(out.n_times(), cube.n_times());
    assert_eq!(out.spatial_dim(), cube.spatial_dim());
    assert_eq!(out.times(), cube.times());
    assert_eq!(out.n_bands(), cube.n_bands() + 3);

    let names = out.band_names();
    assert_eq!(&names[..2], cube.band_names());
    assert_eq!(names[2], WATER_BAND);
    assert_eq!(names[3], WATER_FILL_BAND);
    assert_eq!(names[4], TOTAL_WATER_BAND);
}

#[test]
fn test_each_slice_classified_independently() {
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0), step(12, 12, -0.6, 0.7)],
        vec![flat(12, 12, 0.4), flat(12, 12, 0.4)],
    );
    let out = WaterDetector::new().apply(&cube).unwrap();
    let water = out.band_index(WATER_BAND).unwrap();

    for t in 0..2 {
        for ((y, x), &v) in out.plane(water, t).indexed_iter() {
            let expected = if x >= 6 { 1.0 } else { 0.0 };
            assert_eq!(v, expected, "t={} pixel ({}, {})", t, y, x);
        }
    }
}

#[test]
fn test_total_equals_water_plus_fill_counts() {
    // Fill path active on the left half at t=1, plain water at t=0
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0), step(12, 12, -1.0, -0.2)],
        vec![flat(12, 12, 0.4), step(12, 12, 0.9, 0.1)],
    );
    let out = WaterDetector::new().apply(&cube).unwrap();
    let water = out.band_index(WATER_BAND).unwrap();
    let fill = out.band_index(WATER_FILL_BAND).unwrap();
    let total = out.band_index(TOTAL_WATER_BAND).unwrap();

    for t in 0..out.n_times() {
        let ones = |band: usize| {
            out.plane(band, t)
                .iter()
                .filter(|&&v| v == 1.0)
                .count()
        };
        assert_eq!(
            ones(total),
            ones(water) + ones(fill),
            "counts disagree at t={}",
            t
        );
    }
}

#[test]
fn test_missing_pixels_propagate_to_outputs() {
    let mut plane = step(12, 12, -1.0, 1.0);
    plane[[3, 8]] = f32::NAN;
    plane[[9, 2]] = f32::NAN;
    let cube = make_cube(vec![plane], vec![flat(12, 12, 0.4)]);

    let out = WaterDetector::new().apply(&cube).unwrap();
    for band_name in [WATER_BAND, WATER_FILL_BAND, TOTAL_WATER_BAND] {
        let band = out.band_index(band_name).unwrap();
        let plane = out.plane(band, 0);
        assert!(plane[[3, 8]].is_nan(), "{} not masked at (3, 8)", band_name);
        assert!(plane[[9, 2]].is_nan(), "{} not masked at (9, 2)", band_name);
        assert!(!plane[[3, 2]].is_nan());
    }
}

#[test]
fn test_deterministic_output() {
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0), step(12, 12, -1.0, -0.2)],
        vec![flat(12, 12, 0.4), step(12, 12, 0.9, 0.1)],
    );
    let detector = WaterDetector::new();
    let first = detector.apply(&cube).unwrap();
    let second = detector.apply(&cube).unwrap();

    assert_eq!(first.band_names(), second.band_names());
    for (a, b) in first.data().iter().zip(second.data().iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_uniform_slice_fails_whole_invocation() {
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0), flat(12, 12, 0.3)],
        vec![flat(12, 12, 0.4), flat(12, 12, 0.4)],
    );
    let result = WaterDetector::new().apply(&cube);
    assert!(matches!(result, Err(WaterError::DegenerateSample(_))));
}

#[test]
fn test_missing_band_is_a_fault() {
    let cube = make_cube(
        vec![step(12, 12, -1.0, 1.0)],
        vec![flat(12, 12, 0.4)],
    );
    let mut params = WaterDetectParams::default();
    params.wo_band = "occurrence".to_string();
    let detector = WaterDetector::with_params(params).unwrap();
    assert!(matches!(
        detector.apply(&cube),
        Err(WaterError::BandNotFound(_))
    ));
}

#[test]
fn test_area_uses_pixel_resolution() {
    // 20 m x 50 m pixels: 1000 m2 each, 72 water pixels
    let cube = make_cube(vec![step(12, 12, -1.0, 1.0)], vec![flat(12, 12, 0.4)]);
    let detector = WaterDetector::new();

    let mndwi = waterwatch::TimeSlice::from_plane(cube.plane(0, 0));
    let wo = waterwatch::TimeSlice::from_plane(cube.plane(1, 0));
    let classified = detector
        .classify_slice(&mndwi, &wo, cube.resolution().pixel_area())
        .unwrap();
    assert_eq!(classified.water_area, 72_000.0);
    assert_eq!(classified.filled_area, 0.0);
    assert_eq!(classified.total_area(), 72_000.0);
}
