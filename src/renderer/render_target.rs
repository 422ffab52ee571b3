// renderer/render_target.rs
//
// Float accumulation targets. Two textures ping-pong: the trace kernel reads
// last frame's result from one and writes the blended frame into the other.

pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub struct AccumulationTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl AccumulationTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ACCUMULATION_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

#[derive(Default)]
pub struct RenderTargetManager {
    targets: Option<[AccumulationTarget; 2]>,
    width: u32,
    height: u32,
    current: usize,
}

impl RenderTargetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the live pair, `(0, 0)` before the first frame.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn needs_recreate(&self, width: u32, height: u32) -> bool {
        self.targets.is_none() || (width, height) != (self.width, self.height)
    }

    /// Recreates both targets when the size changed. Returns true when it did.
    pub fn ensure(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.needs_recreate(width, height) {
            return false;
        }

        self.targets = Some([
            AccumulationTarget::new(device, width, height, "AccumulationTargetA"),
            AccumulationTarget::new(device, width, height, "AccumulationTargetB"),
        ]);
        self.width = width;
        self.height = height;
        self.current = 0;
        log::info!("Created {}x{} accumulation targets", width, height);
        true
    }

    /// Index of the target written this frame.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Target this frame writes.
    pub fn output(&self) -> Option<&AccumulationTarget> {
        self.targets.as_ref().map(|t| &t[self.current])
    }

    /// Target holding the accumulated history.
    pub fn history(&self) -> Option<&AccumulationTarget> {
        self.targets.as_ref().map(|t| &t[1 - self.current])
    }

    /// Makes this frame's output next frame's history.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}
