use render_sandbox::{
    app::{Sandbox, run},
    cgmath::{Matrix4, SquareMatrix},
    config::{CursorMode, SandboxConfig},
    context::Context,
    data_structures::model::Model,
    frame::Frame,
    pick::{PICK_DEPTH_FORMAT, PICK_FORMAT, PickTarget},
    shader::{Shader, ShaderDesc, uniform::UniformStruct},
    wgpu,
};
use sandbox_demos::{
    ASSET_ROOT, lit_uniforms, outline_uniforms, set_camera, set_directional_light,
    set_spot_light, shader_path,
};

const SELECTED: u32 = 1;
const OUTLINE_WIDTH: f32 = 0.03;

fn stencil(
    compare: wgpu::CompareFunction,
    pass_op: wgpu::StencilOperation,
    write_mask: u32,
) -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xff,
        write_mask,
    }
}

struct Picking {
    model: Model,
    lit: Shader,
    outline: Shader,
    pick: Shader,
    target: PickTarget,
    hovered: Option<u32>,
}

impl Sandbox for Picking {
    async fn init(ctx: &mut Context) -> anyhow::Result<Self> {
        let format = ctx.surface_format();
        let depth = ctx.depth_format();
        let vertex = ctx.asset(shader_path("vertex.wgsl"));

        // Every lit fragment writes the stencil reference: 1 for the
        // selection, 0 for everything else.
        let lit = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            &vertex,
            ctx.asset(shader_path("lit_fragment.wgsl")),
            ShaderDesc::new("lit", lit_uniforms(), format)
                .with_samplers(&["u_Material.texture_diffuse1", "u_Material.texture_specular1"])
                .with_depth(depth)
                .with_stencil(stencil(
                    wgpu::CompareFunction::Always,
                    wgpu::StencilOperation::Replace,
                    0xff,
                )),
        )
        .await?;
        let outline = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            ctx.asset(shader_path("outline_vertex.wgsl")),
            ctx.asset(shader_path("unlit_fragment.wgsl")),
            ShaderDesc::new("outline", outline_uniforms(), format)
                .with_depth(depth)
                .with_depth_write(false)
                .with_depth_compare(wgpu::CompareFunction::Always)
                .with_stencil(stencil(
                    wgpu::CompareFunction::NotEqual,
                    wgpu::StencilOperation::Keep,
                    0x00,
                )),
        )
        .await?;
        let pick = Shader::from_files(
            &ctx.device,
            &ctx.queue,
            &vertex,
            ctx.asset(shader_path("pick_fragment.wgsl")),
            ShaderDesc::new("pick", UniformStruct::transforms(), PICK_FORMAT)
                .with_depth(PICK_DEPTH_FORMAT),
        )
        .await?;

        let model_path = ctx.asset("models/crates/crates.obj");
        let model = Model::load(&ctx.device, &mut ctx.textures, &mut ctx.ids, &model_path).await;
        log::info!(
            "{} meshes loaded from {}",
            model.meshes().len(),
            model.directory().display()
        );

        let (width, height) = ctx.size();
        Ok(Self {
            model,
            lit,
            outline,
            pick,
            target: PickTarget::new(&ctx.device, width, height),
            hovered: None,
        })
    }

    fn on_resize(&mut self, ctx: &mut Context, width: u32, height: u32) {
        self.target.resize(&ctx.device, width, height);
    }

    fn on_prepass(
        &mut self,
        ctx: &mut Context,
        encoder: &mut wgpu::CommandEncoder,
    ) -> anyhow::Result<()> {
        let (view, projection) = (ctx.view_matrix(), ctx.projection_matrix());
        self.pick.set_matrix4f("u_Model", &Matrix4::identity())?;
        set_camera(&mut self.pick, &ctx.camera, &view, &projection)?;
        {
            let pass = self.target.begin_pass(encoder);
            let mut frame = Frame::new(ctx.frame_index(), pass);
            self.pick.use_program(&mut frame);
            self.model.draw(&mut self.pick, &mut frame)?;
        }
        self.target.copy_pixel(encoder, ctx.cursor);
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut Context, frame: &mut Frame) -> anyhow::Result<()> {
        let (view, projection) = (ctx.view_matrix(), ctx.projection_matrix());
        let model = Matrix4::identity();

        set_camera(&mut self.lit, &ctx.camera, &view, &projection)?;
        self.lit.set_matrix4f("u_Model", &model)?;
        self.lit.set_uniform_float("u_Material.shininess", 32.0)?;
        self.lit.set_uniform_int("u_PointLightCount", 0)?;
        set_directional_light(&mut self.lit)?;
        set_spot_light(&mut self.lit, &ctx.camera, false)?;
        self.lit.use_program(frame);
        for mesh in self.model.meshes() {
            let reference = if Some(mesh.id()) == self.hovered { SELECTED } else { 0 };
            frame.pass().set_stencil_reference(reference);
            mesh.draw(&mut self.lit, frame)?;
        }

        let Some(selected) = self
            .hovered
            .and_then(|id| self.model.meshes().iter().find(|m| m.id() == id))
        else {
            return Ok(());
        };
        set_camera(&mut self.outline, &ctx.camera, &view, &projection)?;
        self.outline.set_matrix4f("u_Model", &model)?;
        self.outline.set_uniform4f("u_Color", 1.0, 0.6, 0.1, 1.0)?;
        self.outline.set_uniform_float("u_OutlineWidth", OUTLINE_WIDTH)?;
        self.outline.use_program(frame);
        frame.pass().set_stencil_reference(SELECTED);
        selected.draw(&mut self.outline, frame)?;
        Ok(())
    }

    fn on_submitted(&mut self, ctx: &mut Context) {
        let hovered = self.target.read_id(&ctx.device);
        if hovered != self.hovered {
            match hovered.and_then(|id| self.model.meshes().iter().find(|m| m.id() == id)) {
                Some(mesh) => log::info!("hovering {} (id {})", mesh.label, mesh.id()),
                None => log::info!("hovering nothing"),
            }
            self.hovered = hovered;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = SandboxConfig::new("Mouse picking")
        .with_size(1600, 900)
        .with_cursor(CursorMode::Free)
        .with_stencil(true)
        .with_asset_root(ASSET_ROOT);
    run::<Picking>(config)
}
