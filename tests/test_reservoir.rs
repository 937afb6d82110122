use geojson::FeatureCollection;
use waterwatch::{reservoirs_from_features, GeometryApi, ReservoirGeometry};

const COLLECTION: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[5.0, 51.0], [5.1, 51.0], [5.1, 51.1], [5.0, 51.1], [5.0, 51.0]]]
            },
            "properties": {
                "fid": 1,
                "source_nam": "grand",
                "source_id": "GR-1",
                "name": "Stuwmeer",
                "name_en": "Reservoir",
                "grand_id": 1001
            }
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                    [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]
                ]
            },
            "properties": {
                "fid": 2,
                "source_nam": "hydrolakes",
                "source_id": null,
                "name": null,
                "name_en": null,
                "grand_id": null
            }
        }
    ]
}"#;

#[test]
fn test_parse_feature_collection() {
    let collection: FeatureCollection = COLLECTION.parse().unwrap();
    let reservoirs = reservoirs_from_features(&collection).unwrap();

    assert_eq!(reservoirs.len(), 2);

    let first = &reservoirs[0];
    assert_eq!(first.fid, 1);
    assert_eq!(first.source_name, "grand");
    assert_eq!(first.name_en.as_deref(), Some("Reservoir"));
    assert_eq!(first.grand_id, Some(1001));
    assert!(matches!(first.geometry, ReservoirGeometry::Polygon(_)));

    let second = &reservoirs[1];
    assert_eq!(second.fid, 2);
    assert_eq!(second.source_id, None);
    match &second.geometry {
        ReservoirGeometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
        other => panic!("expected multi-polygon, got {:?}", other),
    }
}

#[test]
fn test_geometry_api_endpoint() {
    let api = GeometryApi::new("https://api.globalwaterwatch.example").unwrap();
    assert_eq!(
        api.geometry_url(),
        "https://api.globalwaterwatch.example/reservoir/geometry"
    );
}
