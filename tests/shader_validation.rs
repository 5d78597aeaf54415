//! Checks that the bundled WGSL compiles and exposes the expected entry points.

const STAGE_WGSL: &str = include_str!("../src/gpu/stage.wgsl");
const POINTS_WGSL: &str = include_str!("../src/gpu/points.wgsl");

fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<(naga::ShaderStage, &str)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.stage, ep.name.as_str()))
        .collect()
}

#[test]
fn test_stage_shader_valid() {
    let module = validate_wgsl(STAGE_WGSL).unwrap();
    let eps = entry_points(&module);
    assert!(eps.contains(&(naga::ShaderStage::Vertex, "vs_main")));
    assert!(eps.contains(&(naga::ShaderStage::Fragment, "fs_main")));
}

#[test]
fn test_points_shader_valid() {
    let module = validate_wgsl(POINTS_WGSL).unwrap();
    let eps = entry_points(&module);
    assert!(eps.contains(&(naga::ShaderStage::Vertex, "vs_main")));
    assert!(eps.contains(&(naga::ShaderStage::Fragment, "fs_main")));
}

#[test]
fn test_shaders_share_camera_binding() {
    for source in [STAGE_WGSL, POINTS_WGSL] {
        assert!(source.contains("@group(0) @binding(0)"));
        assert!(source.contains("struct Camera"));
    }
}
