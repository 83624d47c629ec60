use anyhow::Context;
use layerview::{
    init_logging, ExtrusionGeometry, ExtrusionLoop, ExtrusionPath, ExtrusionRole, GeometryStats,
    InstanceArray, Layer, LayerRegion, Point2, PreviewConfig, Print, PrintObject, PrintStep,
    TubeMesh, Vertex,
};

/// Twenty 0.2 mm layers of a 20 mm square with zig-zag infill.
fn sample_print() -> Print {
    let height = 0.2;
    let mut object = PrintObject::default();
    for i in 0..20 {
        let mut region = LayerRegion::default();
        region.perimeters.push(ExtrusionLoop::from_polygon(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(20.0, 0.0),
                Point2::new(20.0, 20.0),
                Point2::new(0.0, 20.0),
            ],
            0.45,
            height,
            ExtrusionRole::ExternalPerimeter,
        ));
        let infill = (1..40)
            .map(|k| {
                let x = k as f32 * 0.5;
                Point2::new(x, if k % 2 == 0 { 0.5 } else { 19.5 })
            })
            .collect();
        region.fills.push(
            ExtrusionPath::new(infill, 0.45, height, ExtrusionRole::InternalInfill).with_flow(0.08),
        );
        let mut layer = Layer::new(height * (i + 1) as f32, height);
        layer.regions.push(region);
        object.layers.push(layer);
    }
    object.copies = vec![Point2::new(80.0, 80.0), Point2::new(110.0, 80.0)];

    let mut print = Print::new(vec![object], Vec::new());
    print.set_step_done(PrintStep::Slice);
    print
}

fn load_print(path: Option<&str>) -> anyhow::Result<Print> {
    let Some(path) = path else {
        return Ok(sample_print());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path))
}

fn load_config(path: Option<&str>) -> anyhow::Result<PreviewConfig> {
    let Some(path) = path else {
        return Ok(PreviewConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    Ok(PreviewConfig::from_json(&text)?)
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!(
        version = layerview::VERSION,
        built = layerview::BUILD_DATE,
        "layerview"
    );

    let args: Vec<String> = std::env::args().collect();
    let print = load_print(args.get(1).map(String::as_str))?;
    let config = load_config(args.get(2).map(String::as_str))?;

    if !print.is_step_done(PrintStep::Slice) {
        tracing::warn!("print is not sliced; nothing to preview");
        return Ok(());
    }

    let perimeters = ExtrusionGeometry::new(0.0);
    let infill = ExtrusionGeometry::new(config.infill_flatness);
    let mut mesh = TubeMesh::new();
    let mut instances = InstanceArray::new();
    let mut stats = GeometryStats::default();

    for object in &print.objects {
        for layer in &object.layers {
            for region in &layer.regions {
                for collection in [&region.perimeters, &region.fills] {
                    for toolpath in collection.flatten() {
                        if let Err(e) = toolpath.validate() {
                            tracing::warn!(error = %e, z = layer.print_z, "skipping toolpath");
                            continue;
                        }
                        let builder = match toolpath.role {
                            Some(role) if role.is_infill() => &infill,
                            _ => &perimeters,
                        };
                        for &copy in &object.copies {
                            let mut shifted = toolpath.clone();
                            shifted.translate(copy);
                            stats.merge(&builder.build_toolpath(&shifted, layer.print_z, &mut mesh));
                            instances.extend_from_toolpath(&shifted, layer.print_z, [1.0; 4]);
                        }
                    }
                }
            }
        }
    }
    instances.sort_by_z();

    tracing::info!(
        segments = stats.segments,
        joints = stats.joints,
        caps = stats.caps,
        triangles = stats.total_triangles(),
        mesh_bytes = mesh.triangle_count() * 3 * std::mem::size_of::<Vertex>(),
        instance_bytes = instances.as_bytes().len(),
        bounds = ?instances.bounding_box(),
        "geometry built"
    );
    Ok(())
}
