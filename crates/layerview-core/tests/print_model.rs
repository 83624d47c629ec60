use layerview_core::{
    ExtrusionCollection, ExtrusionLoop, ExtrusionPath, ExtrusionRole, Layer, LayerRegion, Point2,
    Print, PrintObject, PrintStep,
};

fn sample_print() -> Print {
    let mut region = LayerRegion::default();
    region.perimeters.push(ExtrusionLoop::from_polygon(
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 20.0),
        ],
        0.45,
        0.2,
        ExtrusionRole::ExternalPerimeter,
    ));
    region.fills.push(ExtrusionCollection::new(vec![ExtrusionPath::new(
        vec![Point2::new(1.0, 1.0), Point2::new(19.0, 19.0)],
        0.45,
        0.2,
        ExtrusionRole::InternalInfill,
    )
    .into()]));

    let mut layer = Layer::new(0.2, 0.2);
    layer.regions.push(region);

    let object = PrintObject {
        layers: vec![layer],
        support_layers: Vec::new(),
        copies: vec![Point2::new(0.0, 0.0), Point2::new(30.0, 0.0)],
    };
    Print::new(vec![object], Vec::new())
}

#[test]
fn test_print_from_json_flattens() {
    let json = r#"{
        "objects": [{
            "layers": [{
                "print_z": 0.3,
                "height": 0.3,
                "regions": [{
                    "perimeters": {"entities": [
                        {"Path": {"polyline": [{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 0.0}],
                                  "width": 0.5, "height": 0.3, "role": "Perimeter"}}
                    ]},
                    "fills": {"entities": []}
                }]
            }],
            "copies": [{"x": 0.0, "y": 0.0}]
        }],
        "bed_shape": []
    }"#;

    let print: Print = serde_json::from_str(json).expect("valid print json");
    assert!(!print.is_step_done(PrintStep::Slice));

    let layer = &print.objects[0].layers[0];
    let toolpaths = layer.regions[0].perimeters.flatten();
    assert_eq!(toolpaths.len(), 1);
    assert_eq!(toolpaths[0].widths, vec![0.5]);
    assert!((toolpaths[0].lines[0].length() - 5.0).abs() < 1e-6);
}

#[test]
fn test_copies_translate_toolpaths() {
    let print = sample_print();
    let object = &print.objects[0];
    let region = &object.layers[0].regions[0];

    let mut shifted = Vec::new();
    for copy in &object.copies {
        for mut tp in region.perimeters.flatten() {
            tp.translate(*copy);
            shifted.push(tp);
        }
    }

    assert_eq!(shifted.len(), 2);
    assert_eq!(shifted[1].lines[0].a, Point2::new(30.0, 0.0));
    assert!(shifted.iter().all(|tp| tp.closed && tp.validate().is_ok()));
}

#[test]
fn test_infill_collection_is_open() {
    let print = sample_print();
    let fills = print.objects[0].layers[0].regions[0].fills.flatten();
    assert_eq!(fills.len(), 1);
    assert!(!fills[0].closed);
    assert_eq!(fills[0].role, Some(ExtrusionRole::InternalInfill));
}
