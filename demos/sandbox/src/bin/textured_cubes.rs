use render_sandbox::{
    KeyCode, ModifiersState,
    app::{Sandbox, run},
    cgmath::{Deg, InnerSpace, Matrix4, Vector3},
    config::SandboxConfig,
    context::Context,
    data_structures::mesh::{Mesh, MeshTexture, TextureKind, VertexLayout},
    frame::Frame,
    shader::{Shader, ShaderDesc},
    wgpu,
};
use sandbox_demos::{ASSET_ROOT, CUBE_VERTICES, set_camera, shader_path, textured_uniforms};

const CUBE_POSITIONS: [[f32; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [2.0, 5.0, -15.0],
    [-1.5, -2.2, -2.5],
    [-3.8, -2.0, -12.3],
    [2.4, -0.4, -3.5],
    [-1.7, 3.0, -7.5],
    [1.3, -2.0, -2.5],
    [1.5, 2.0, -2.5],
    [1.5, 0.2, -1.5],
    [-1.3, 1.0, -1.5],
];

struct TexturedCubes {
    shader: Shader,
    cube: Mesh,
    mix: f32,
    time: f32,
}

impl Sandbox for TexturedCubes {
    async fn init(ctx: &mut Context) -> anyhow::Result<Self> {
        let desc = ShaderDesc::new("textured", textured_uniforms(), ctx.surface_format())
            .with_samplers(&["u_Material.texture_diffuse1", "u_Material.texture_diffuse2"])
            .with_depth(ctx.depth_format());
        let shader = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            ctx.asset(shader_path("vertex.wgsl")),
            ctx.asset(shader_path("textured_fragment.wgsl")),
            desc,
        )
        .await?;

        let container_path = ctx.asset("textures/container.png");
        let face_path = ctx.asset("textures/awesomeface.png");
        let container = ctx.textures.get(container_path);
        let face = ctx.textures.get(face_path);
        face.set_wrap_mode(
            wgpu::AddressMode::ClampToEdge,
            wgpu::AddressMode::ClampToEdge,
        );

        let cube = Mesh::from_interleaved(
            &ctx.device,
            "cube",
            &CUBE_VERTICES,
            VertexLayout::Standard,
            &mut ctx.ids,
        )?
        .with_textures(vec![
            MeshTexture {
                texture: container,
                kind: TextureKind::Diffuse,
            },
            MeshTexture {
                texture: face,
                kind: TextureKind::Diffuse,
            },
        ]);

        Ok(Self {
            shader,
            cube,
            mix: 0.2,
            time: 0.0,
        })
    }

    fn on_key_pressed(&mut self, _ctx: &mut Context, key: KeyCode, _modifiers: ModifiersState) {
        match key {
            KeyCode::KeyE => self.mix = (self.mix + 0.1).min(1.0),
            KeyCode::KeyQ => self.mix = (self.mix - 0.1).max(0.0),
            _ => return,
        }
        log::info!("texture mix {:.1}", self.mix);
    }

    fn on_update(&mut self, _ctx: &mut Context, time: f32, _dt: f32) {
        self.time = time;
    }

    fn on_render(&mut self, ctx: &mut Context, frame: &mut Frame) -> anyhow::Result<()> {
        let (view, projection) = (ctx.view_matrix(), ctx.projection_matrix());
        set_camera(&mut self.shader, &ctx.camera, &view, &projection)?;
        self.shader.set_uniform_float("u_MixFactor", self.mix)?;
        self.shader.use_program(frame);

        for (i, position) in CUBE_POSITIONS.iter().enumerate() {
            let angle = 20.0 * i as f32 + 25.0 * self.time;
            let axis = Vector3::new(1.0, 0.3, 0.5).normalize();
            let model = Matrix4::from_translation((*position).into())
                * Matrix4::from_axis_angle(axis, Deg(angle));
            self.shader.set_matrix4f("u_Model", &model)?;
            self.cube.draw(&mut self.shader, frame)?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = SandboxConfig::new("Textured cubes").with_asset_root(ASSET_ROOT);
    run::<TexturedCubes>(config)
}
