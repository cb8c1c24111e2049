use render_sandbox::{
    KeyCode, ModifiersState,
    app::{Sandbox, run},
    cgmath::{Matrix4, Vector3},
    config::SandboxConfig,
    context::Context,
    data_structures::mesh::{Mesh, MeshTexture, TextureKind, VertexLayout},
    frame::Frame,
    material::{EMERALD, Material, OBSIDIAN, RUBY},
    shader::{Shader, ShaderDesc},
};
use sandbox_demos::{
    ASSET_ROOT, CUBE_VERTICES, MAX_POINT_LIGHTS, lit_uniforms, material_uniforms,
    set_camera, set_directional_light, set_point_light, set_spot_light, shader_path,
    unlit_uniforms,
};

/// Point lights circle around these positions: x follows sin(t), z cos(t).
const POINT_LIGHT_BASES: [[f32; 3]; MAX_POINT_LIGHTS] = [
    [-4.0, 2.0, -2.5],
    [0.7, 0.2, 2.0],
    [2.3, -3.3, -4.0],
    [0.0, 0.0, -3.0],
];

const CRATE_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.5, 0.5, -2.0],
    [-1.8, -0.5, -3.0],
    [2.5, -1.0, -5.0],
];

const PRESET_CUBES: [([f32; 3], Material); 3] = [
    ([-2.0, 1.5, -1.0], OBSIDIAN),
    ([0.0, 1.5, -1.5], EMERALD),
    ([2.0, 1.5, -1.0], RUBY),
];

const LIGHT_CUBE_SCALE: f32 = 0.2;

struct LitScene {
    lit: Shader,
    material: Shader,
    unlit: Shader,
    crate_cube: Mesh,
    plain_cube: Mesh,
    point_lights: usize,
    flashlight: bool,
    time: f32,
}

impl LitScene {
    fn point_light_positions(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        let (sin, cos) = self.time.sin_cos();
        POINT_LIGHT_BASES
            .iter()
            .take(self.point_lights)
            .map(move |[x, y, z]| Vector3::new(sin * x, *y, cos * z))
    }
}

impl Sandbox for LitScene {
    async fn init(ctx: &mut Context) -> anyhow::Result<Self> {
        let format = ctx.surface_format();
        let depth = ctx.depth_format();
        let vertex = ctx.asset(shader_path("vertex.wgsl"));

        let lit = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            &vertex,
            ctx.asset(shader_path("lit_fragment.wgsl")),
            ShaderDesc::new("lit", lit_uniforms(), format)
                .with_samplers(&["u_Material.texture_diffuse1", "u_Material.texture_specular1"])
                .with_depth(depth),
        )
        .await?;
        let material = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            &vertex,
            ctx.asset(shader_path("material_fragment.wgsl")),
            ShaderDesc::new("material", material_uniforms(), format).with_depth(depth),
        )
        .await?;
        let unlit = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            &vertex,
            ctx.asset(shader_path("unlit_fragment.wgsl")),
            ShaderDesc::new("unlit", unlit_uniforms(), format).with_depth(depth),
        )
        .await?;

        let diffuse_path = ctx.asset("textures/container.png");
        let specular_path = ctx.asset("textures/container_specular.png");
        let textures = vec![
            MeshTexture {
                texture: ctx.textures.get(diffuse_path),
                kind: TextureKind::Diffuse,
            },
            MeshTexture {
                texture: ctx.textures.get(specular_path),
                kind: TextureKind::Specular,
            },
        ];
        let crate_cube = Mesh::from_interleaved(
            &ctx.device,
            "crate",
            &CUBE_VERTICES,
            VertexLayout::Standard,
            &mut ctx.ids,
        )?
        .with_textures(textures);
        let plain_cube = Mesh::from_interleaved(
            &ctx.device,
            "plain cube",
            &CUBE_VERTICES,
            VertexLayout::Standard,
            &mut ctx.ids,
        )?;

        Ok(Self {
            lit,
            material,
            unlit,
            crate_cube,
            plain_cube,
            point_lights: 1,
            flashlight: true,
            time: 0.0,
        })
    }

    fn on_key_pressed(&mut self, _ctx: &mut Context, key: KeyCode, _modifiers: ModifiersState) {
        match key {
            KeyCode::KeyF => {
                self.flashlight = !self.flashlight;
                log::info!("flashlight {}", if self.flashlight { "on" } else { "off" });
            }
            KeyCode::Digit0 => self.point_lights = 0,
            KeyCode::Digit1 => self.point_lights = 1,
            KeyCode::Digit2 => self.point_lights = 2,
            KeyCode::Digit3 => self.point_lights = 3,
            KeyCode::Digit4 => self.point_lights = 4,
            _ => {}
        }
    }

    fn on_update(&mut self, _ctx: &mut Context, time: f32, _dt: f32) {
        self.time = time;
    }

    fn on_render(&mut self, ctx: &mut Context, frame: &mut Frame) -> anyhow::Result<()> {
        let (view, projection) = (ctx.view_matrix(), ctx.projection_matrix());
        let lights: Vec<Vector3<f32>> = self.point_light_positions().collect();

        set_camera(&mut self.lit, &ctx.camera, &view, &projection)?;
        self.lit.set_uniform_float("u_Material.shininess", 32.0)?;
        set_directional_light(&mut self.lit)?;
        self.lit
            .set_uniform_int("u_PointLightCount", lights.len() as i32)?;
        for (i, position) in lights.iter().enumerate() {
            set_point_light(&mut self.lit, i, *position)?;
        }
        set_spot_light(&mut self.lit, &ctx.camera, self.flashlight)?;
        self.lit.use_program(frame);
        for position in CRATE_POSITIONS {
            self.lit
                .set_matrix4f("u_Model", &Matrix4::from_translation(position.into()))?;
            self.crate_cube.draw(&mut self.lit, frame)?;
        }

        set_camera(&mut self.material, &ctx.camera, &view, &projection)?;
        set_directional_light(&mut self.material)?;
        self.material.use_program(frame);
        for (position, preset) in PRESET_CUBES {
            preset.apply(&mut self.material, "u_Material")?;
            let model = Matrix4::from_translation(position.into()) * Matrix4::from_scale(0.5);
            self.material.set_matrix4f("u_Model", &model)?;
            self.plain_cube.draw(&mut self.material, frame)?;
        }

        set_camera(&mut self.unlit, &ctx.camera, &view, &projection)?;
        self.unlit.set_uniform4f("u_Color", 1.0, 1.0, 1.0, 1.0)?;
        self.unlit.use_program(frame);
        for position in lights {
            let model =
                Matrix4::from_translation(position) * Matrix4::from_scale(LIGHT_CUBE_SCALE);
            self.unlit.set_matrix4f("u_Model", &model)?;
            self.plain_cube.draw(&mut self.unlit, frame)?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = SandboxConfig::new("Lit scene")
        .with_size(1600, 900)
        .with_asset_root(ASSET_ROOT);
    run::<LitScene>(config)
}
