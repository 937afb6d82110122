use chrono::{TimeZone, Utc};
use ndarray::{s, Array2, Array4};
use waterwatch::{
    CoverageFilter, CoverageFilterParams, DataCube, PixelResolution, QualityFilter,
    QualityFilterParams, WaterDetector,
};

const BAND_NAMES: [&str; 6] = ["green", "nir", "swir", "cloudp", "MNDWI", "wo"];

/// Full six-band scene cube: three reflectance bands, cloud percentage,
/// water index and historical occurrence
fn scene_cube(planes: Vec<[Array2<f32>; 6]>) -> DataCube {
    let nt = planes.len();
    let (height, width) = planes[0][0].dim();
    let mut data = Array4::zeros((6, nt, height, width));
    for (t, bands) in planes.iter().enumerate() {
        for (b, plane) in bands.iter().enumerate() {
            data.slice_mut(s![b, t, .., ..]).assign(plane);
        }
    }
    let times = (0..nt)
        .map(|i| Utc.with_ymd_and_hms(2021, 8, 1 + i as u32, 0, 0, 0).unwrap())
        .collect();
    DataCube::new(
        data,
        BAND_NAMES.iter().map(|b| b.to_string()).collect(),
        times,
        PixelResolution::new(20.0, 50.0).unwrap(),
    )
    .unwrap()
}

fn flat(value: f32) -> Array2<f32> {
    Array2::from_elem((12, 12), value)
}

fn mndwi_step() -> Array2<f32> {
    Array2::from_shape_fn((12, 12), |(_, x)| if x < 6 { -1.0 } else { 1.0 })
}

fn scene(cloudp: f32, observed: bool) -> [Array2<f32>; 6] {
    let reflectance = if observed { flat(0.2) } else { flat(f32::NAN) };
    [
        reflectance.clone(),
        reflectance.clone(),
        reflectance,
        flat(cloudp),
        mndwi_step(),
        flat(0.4),
    ]
}

#[test]
fn test_quality_filter_preserves_bands() {
    let cube = scene_cube(vec![scene(10.0, true), scene(100.0, true)]);
    let filtered = QualityFilter::new().apply(&cube).unwrap();

    assert_eq!(filtered.n_times(), 1);
    assert_eq!(filtered.band_names(), cube.band_names());
    assert_eq!(filtered.times()[0], cube.times()[0]);
    assert_eq!(filtered.spatial_dim(), cube.spatial_dim());
}

#[test]
fn test_coverage_filter_drops_unobserved_scene() {
    let cube = scene_cube(vec![scene(10.0, true), scene(10.0, false)]);
    let filtered = CoverageFilter::new().apply(&cube).unwrap();

    assert_eq!(filtered.n_times(), 1);
    assert_eq!(filtered.times()[0], cube.times()[0]);
}

#[test]
fn test_filter_chain_then_classify() {
    // t0 clean, t1 cloudy, t2 unobserved: only t0 survives the chain
    let cube = scene_cube(vec![
        scene(10.0, true),
        scene(100.0, true),
        scene(5.0, false),
    ]);

    let covered = CoverageFilter::new().apply(&cube).unwrap();
    assert_eq!(covered.n_times(), 2);

    let clean = QualityFilter::new().apply(&covered).unwrap();
    assert_eq!(clean.n_times(), 1);
    assert_eq!(clean.times()[0], cube.times()[0]);

    let classified = WaterDetector::new().apply(&clean).unwrap();
    assert_eq!(classified.n_bands(), 9);
    let water = classified.band_index("water").unwrap();
    let wet = classified
        .plane(water, 0)
        .iter()
        .filter(|&&v| v == 1.0)
        .count();
    assert_eq!(wet, 72);
}

#[test]
fn test_custom_filter_parameters() {
    let cube = scene_cube(vec![scene(10.0, true), scene(30.0, true), scene(100.0, true)]);

    // A stricter cutoff drops the mid-cloud scene too
    let strict = QualityFilter::with_params(QualityFilterParams {
        cutoff_percentile: 20.0,
        ..QualityFilterParams::default()
    })
    .unwrap();
    let filtered = strict.apply(&cube).unwrap();
    assert_eq!(filtered.n_times(), 1);

    // A zero minimum keeps everything that is not fully masked
    let lenient = CoverageFilter::with_params(CoverageFilterParams {
        minimum_filled_fraction: 0.0,
        ..CoverageFilterParams::default()
    })
    .unwrap();
    let kept = lenient.apply(&cube).unwrap();
    assert_eq!(kept.n_times(), 3);
}
