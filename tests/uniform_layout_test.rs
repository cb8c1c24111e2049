use render_sandbox::{
    material::Material,
    shader::{
        ShaderError,
        uniform::{UniformBlock, UniformKind, UniformSlot, UniformStruct, UniformType},
    },
};

fn light() -> UniformStruct {
    UniformStruct::new()
        .with("position", UniformType::Vec3)
        .with("ambient", UniformType::Vec4)
        .with("diffuse", UniformType::Vec4)
        .with("specular", UniformType::Vec4)
        .with("constant", UniformType::Float)
        .with("linear", UniformType::Float)
        .with("quadratic", UniformType::Float)
}

fn spot() -> UniformStruct {
    UniformStruct::new()
        .with("position", UniformType::Vec3)
        .with("direction", UniformType::Vec3)
        .with("ambient", UniformType::Vec4)
        .with("diffuse", UniformType::Vec4)
        .with("specular", UniformType::Vec4)
        .with("constant", UniformType::Float)
        .with("linear", UniformType::Float)
        .with("quadratic", UniformType::Float)
        .with("cutOff", UniformType::Float)
        .with("outerCutOff", UniformType::Float)
}

fn lit_layout() -> UniformStruct {
    UniformStruct::transforms()
        .with("u_ViewPosition", UniformType::Vec3)
        .with("u_PointLightCount", UniformType::Int)
        .with_struct(
            "u_Material",
            UniformStruct::new().with("shininess", UniformType::Float),
        )
        .with_struct(
            "u_DirectionalLight",
            UniformStruct::new()
                .with("direction", UniformType::Vec3)
                .with("ambient", UniformType::Vec4)
                .with("diffuse", UniformType::Vec4)
                .with("specular", UniformType::Vec4),
        )
        .with_array("u_PointLights", UniformType::Struct(light()), 4)
        .with_struct("u_SpotLight", spot())
}

fn offset(block: &UniformBlock, name: &str) -> u32 {
    block
        .slot(name)
        .unwrap_or_else(|| panic!("missing uniform {name}"))
        .offset
}

#[test]
fn scalar_and_vector_sizes_follow_wgsl() {
    assert_eq!(UniformType::Float.size(), 4);
    assert_eq!(UniformType::Vec2.align(), 8);
    assert_eq!(UniformType::Vec3.size(), 12);
    assert_eq!(UniformType::Vec3.align(), 16);
    assert_eq!(UniformType::Mat4.size(), 64);
    assert_eq!(UniformType::Struct(light()).size(), 80);
    assert_eq!(UniformType::Struct(spot()).size(), 112);
    assert_eq!(UniformType::Array(Box::new(UniformType::Float), 3).size(), 48);
}

#[test]
fn transforms_prefix_is_three_matrices() {
    let block = UniformBlock::new(&UniformStruct::transforms());
    assert_eq!(offset(&block, "u_Model"), 0);
    assert_eq!(offset(&block, "u_View"), 64);
    assert_eq!(offset(&block, "u_Projection"), 128);
    assert_eq!(block.size(), 192);
}

#[test]
fn lit_block_matches_the_shader_struct() {
    let block = UniformBlock::new(&lit_layout());
    assert_eq!(offset(&block, "u_ViewPosition"), 192);
    assert_eq!(offset(&block, "u_PointLightCount"), 204);
    assert_eq!(offset(&block, "u_Material.shininess"), 208);
    assert_eq!(offset(&block, "u_DirectionalLight.direction"), 224);
    assert_eq!(offset(&block, "u_DirectionalLight.specular"), 272);
    assert_eq!(offset(&block, "u_PointLights[0].position"), 288);
    assert_eq!(offset(&block, "u_PointLights[0].quadratic"), 360);
    assert_eq!(offset(&block, "u_PointLights[1].position"), 368);
    assert_eq!(offset(&block, "u_PointLights[3].constant"), 288 + 3 * 80 + 64);
    assert_eq!(offset(&block, "u_SpotLight.position"), 608);
    assert_eq!(offset(&block, "u_SpotLight.outerCutOff"), 608 + 96);
    assert_eq!(block.size(), 720);
}

#[test]
fn material_block_pads_the_struct() {
    let layout = UniformStruct::transforms()
        .with("u_ViewPosition", UniformType::Vec3)
        .with_struct("u_Material", Material::uniform_struct())
        .with("u_Time", UniformType::Float);
    let block = UniformBlock::new(&layout);
    assert_eq!(offset(&block, "u_Material.ambient"), 208);
    assert_eq!(offset(&block, "u_Material.shininess"), 256);
    assert_eq!(offset(&block, "u_Time"), 272);
    assert_eq!(block.size(), 288);
}

#[test]
fn slots_report_their_kind() {
    let block = UniformBlock::new(&lit_layout());
    assert_eq!(
        block.slot("u_PointLightCount"),
        Some(UniformSlot {
            offset: 204,
            kind: UniformKind::Int
        })
    );
    assert_eq!(block.slot("u_PointLights"), None);
    assert_eq!(block.slot("u_PointLights[4].position"), None);
    assert!(block.names().any(|n| n == "u_SpotLight.cutOff"));
}

#[test]
fn write_stores_little_endian_bytes_at_the_offset() {
    let mut block = UniformBlock::new(&lit_layout());
    block
        .write("u_Material.shininess", &[UniformKind::Float], &32.0f32.to_le_bytes())
        .unwrap();
    assert_eq!(block.read("u_Material.shininess"), Some(&32.0f32.to_le_bytes()[..]));
    assert_eq!(&block.bytes()[208..212], &32.0f32.to_le_bytes());
}

#[test]
fn unknown_names_are_reported() {
    let mut block = UniformBlock::new(&UniformStruct::transforms());
    let err = block
        .write("u_Nope", &[UniformKind::Float], &1.0f32.to_le_bytes())
        .unwrap_err();
    assert!(err.is_unknown_uniform());
    assert!(matches!(err, ShaderError::UnknownUniform(name) if name == "u_Nope"));
}

#[test]
fn kind_mismatch_is_rejected_and_leaves_data_alone() {
    let mut block = UniformBlock::new(&UniformStruct::transforms());
    let before = block.bytes().to_vec();
    let err = block
        .write("u_Model", &[UniformKind::Vec4], &[0u8; 16])
        .unwrap_err();
    match err {
        ShaderError::UniformTypeMismatch {
            name,
            expected,
            found,
        } => {
            assert_eq!(name, "u_Model");
            assert_eq!(expected, UniformKind::Mat4);
            assert_eq!(found, UniformKind::Vec4);
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(block.bytes(), &before[..]);
}

#[test]
fn empty_block_still_has_a_bindable_size() {
    let block = UniformBlock::new(&UniformStruct::new());
    assert_eq!(block.size(), 16);
    assert_eq!(block.names().count(), 0);
}
