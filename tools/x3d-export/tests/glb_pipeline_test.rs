//! Integration tests for the X3D -> GLB pipeline
//!
//! Tests the full flow on XML text:
//! 1. Generate X3D fixtures
//! 2. Convert in memory
//! 3. Read the container back and validate layout and accessors


use serde_json::{json, Value};
use x3d_export::{
    assemble_glb, convert_x3d_to_memory, read_glb, ConvertOptions, ExportError, GlbError,
};

fn convert(xml: &str) -> (Vec<u8>, Value) {
    let document = convert_x3d_to_memory(xml, &ConvertOptions::default())
        .expect("conversion failed");
    let glb = assemble_glb(&document).expect("framing failed");
    let json = serde_json::from_str(read_glb(&glb).expect("read back failed").json)
        .expect("content is not JSON");
    (glb, json)
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[test]
fn test_tri0_end_to_end() {
    let (glb, json) = convert(&generate_test_assets::tri0_x3d());

    // Preamble
    assert_eq!(&glb[0..4], b"glTF");
    assert_eq!(le_u32(&glb, 4), 1, "version");
    let content_length = le_u32(&glb, 12);
    assert_eq!(content_length % 4, 0);
    assert_eq!(le_u32(&glb, 8), 20 + content_length + 42, "totalLength");
    assert_eq!(le_u32(&glb, 16), 0, "contentFormat");
    assert_eq!(glb.len(), le_u32(&glb, 8) as usize);

    // Accessors
    let accessors = json["accessors"].as_object().unwrap();
    assert_eq!(accessors.len(), 2);
    let primitive = &json["meshes"]["tri0"]["primitives"][0];
    let position = &json["accessors"][primitive["attributes"]["POSITION"].as_str().unwrap()];
    assert_eq!(position["count"], 3);
    assert_eq!(position["type"], "VEC3");
    assert_eq!(position["componentType"], 5126);
    assert_eq!(position["byteStride"], 12);
    assert_eq!(position["min"], json!([0.0, 0.0, 0.0]));
    assert_eq!(position["max"], json!([1.0, 1.0, 0.0]));

    let index = &json["accessors"][primitive["indices"].as_str().unwrap()];
    assert_eq!(index["count"], 3);
    assert_eq!(index["type"], "SCALAR");
    assert_eq!(index["componentType"], 5123);
    assert_eq!(index["byteStride"], 2);
    assert_eq!(index["min"], json!([0]));
    assert_eq!(index["max"], json!([2]));

    assert_eq!(primitive["material"], "default_red");
    assert_eq!(primitive["mode"], 4);
    assert!(primitive["attributes"].get("NORMAL").is_none());

    // Regions
    assert_eq!(json["bufferViews"]["bufferView_0"]["byteLength"], 36);
    assert_eq!(json["bufferViews"]["bufferView_1"]["byteOffset"], 36);
    assert_eq!(json["bufferViews"]["bufferView_1"]["byteLength"], 6);

    let payload = &glb[20 + content_length as usize..];
    let floats: Vec<f32> = payload[..36]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(floats, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    assert_eq!(&payload[36..], &[0, 0, 1, 0, 2, 0]);
}

#[test]
fn test_points_only_mesh_sizes() {
    for triangles in [1, 4, 17] {
        let (mesh, points) = generate_test_assets::soup_x3d("soup", triangles, 7);
        let (glb, json) = convert(&generate_test_assets::scene(&[mesh]));

        let accessors = json["accessors"].as_object().unwrap();
        assert_eq!(accessors.len(), 1);
        assert_eq!(accessors["accessor_0"]["count"], points.len());
        assert_eq!(
            json["bufferViews"]["bufferView_0"]["byteLength"],
            points.len() * 12
        );
        assert_eq!(json["bufferViews"]["bufferView_1"]["byteLength"], 0);
        assert!(json["meshes"]["soup"]["primitives"][0].get("indices").is_none());

        let content_length = le_u32(&glb, 12) as usize;
        assert_eq!(glb.len(), 20 + content_length + points.len() * 12);
    }
}

#[test]
fn test_position_bounds_are_exact_extrema() {
    for seed in 1..6 {
        let (mesh, points) = generate_test_assets::soup_x3d("soup", 9, seed);
        let (_, json) = convert(&generate_test_assets::scene(&[mesh]));
        let accessor = &json["accessors"]["accessor_0"];

        for axis in 0..3 {
            let min = accessor["min"][axis].as_f64().unwrap();
            let max = accessor["max"][axis].as_f64().unwrap();
            assert!(points.iter().all(|p| min <= p[axis] && p[axis] <= max));
            assert!(points.iter().any(|p| p[axis] == min));
            assert!(points.iter().any(|p| p[axis] == max));
        }
    }
}

#[test]
fn test_cube_with_normals_and_indices() {
    let xml = generate_test_assets::scene(&[generate_test_assets::cube_x3d("cube")]);
    let (glb, json) = convert(&xml);

    let primitive = &json["meshes"]["cube"]["primitives"][0];
    let normal = &json["accessors"][primitive["attributes"]["NORMAL"].as_str().unwrap()];
    assert_eq!(normal["count"], 8);
    assert_eq!(normal["byteOffset"], 96);
    assert_eq!(normal["bufferView"], "bufferView_0");
    assert_eq!(normal["min"], json!([-1.0, -1.0, -1.0]));
    assert_eq!(normal["max"], json!([1.0, 1.0, 1.0]));

    let index = &json["accessors"][primitive["indices"].as_str().unwrap()];
    assert_eq!(index["count"], 36);
    assert_eq!(index["max"], json!([7]));
    assert_eq!(json["bufferViews"]["bufferView_1"]["byteLength"], 72);
    assert_eq!(json["bufferViews"]["bufferView_1"]["byteOffset"], 192);

    let content_length = le_u32(&glb, 12);
    assert_eq!(le_u32(&glb, 8), 20 + content_length + 192 + 72);
}

#[test]
fn test_many_meshes_total_length() {
    let mut meshes = vec![generate_test_assets::cube_x3d("cube_a")];
    for i in 0..5 {
        meshes.push(generate_test_assets::soup_x3d(&format!("soup_{i}"), i + 1, i as u64).0);
    }
    meshes.push(generate_test_assets::cube_x3d("cube_b"));
    let (glb, json) = convert(&generate_test_assets::scene(&meshes));

    assert_eq!(json["meshes"].as_object().unwrap().len(), 7);
    let vertex = json["bufferViews"]["bufferView_0"]["byteLength"].as_u64().unwrap();
    let index = json["bufferViews"]["bufferView_1"]["byteLength"].as_u64().unwrap();
    assert_eq!(json["bufferViews"]["bufferView_1"]["byteOffset"], vertex);

    let content_length = u64::from(le_u32(&glb, 12));
    assert_eq!(u64::from(le_u32(&glb, 8)), 20 + content_length + vertex + index);
    assert_eq!(glb.len() as u64, 20 + content_length + vertex + index);
}

#[test]
fn test_round_trip_matches_serialized_document() {
    let xml = generate_test_assets::scene(&[generate_test_assets::cube_x3d("cube")]);
    let document = convert_x3d_to_memory(&xml, &ConvertOptions::default()).unwrap();
    let glb = assemble_glb(&document).unwrap();

    let content_length = le_u32(&glb, 12) as usize;
    let content = std::str::from_utf8(&glb[20..20 + content_length]).unwrap();
    let reparsed: Value = serde_json::from_str(content.trim_end_matches(' ')).unwrap();
    let expected: Value = serde_json::from_str(&document.to_json_string().unwrap()).unwrap();
    assert_eq!(reparsed, expected);
}

#[test]
fn test_index_overflow_aborts_conversion() {
    let xml = r#"<scene><mesh name="wide"><IndexedTriangleSet index="0 1 65536">
        <Coordinate point="0 0 0 1 0 0 0 1 0"/></IndexedTriangleSet></mesh></scene>"#;
    let err = convert_x3d_to_memory(xml, &ConvertOptions::default()).unwrap_err();

    let ExportError::Glb(glb) = &err else {
        panic!("expected a packing error, got {err:?}");
    };
    assert!(matches!(glb, GlbError::Mesh { name, .. } if name == "wide"));
    assert!(matches!(glb.root_cause(), GlbError::Range(_)));
}

#[test]
fn test_empty_point_list_fails() {
    let xml = r#"<scene><mesh name="nothing"><TriangleSet><Coordinate point=" "/></TriangleSet></mesh></scene>"#;
    let err = convert_x3d_to_memory(xml, &ConvertOptions::default()).unwrap_err();

    let ExportError::Glb(glb) = &err else {
        panic!("expected a packing error, got {err:?}");
    };
    assert!(matches!(glb.root_cause(), GlbError::EmptyMesh));
}
