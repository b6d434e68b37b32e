//! The blit shader must parse and validate with naga before any GPU sees it.

use flamometer::gpu::BLIT_SHADER;

/// Validates WGSL code using naga.
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

#[test]
fn test_blit_shader_validates() {
    if let Err(e) = validate_wgsl(BLIT_SHADER) {
        panic!("{}", e);
    }
}

#[test]
fn test_blit_shader_entry_points() {
    let module = validate_wgsl(BLIT_SHADER).expect("valid shader");
    let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"vs_main"));
    assert!(names.contains(&"fs_main"));
}
