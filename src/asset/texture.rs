use std::path::Path;

/// CPU-resident RGBA8 texture with an optional mip chain.
///
/// `mips[0]` is the base level; every further level halves both dimensions
/// (clamped to 1).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub mips: Vec<Vec<u8>>,
}

impl TextureData {
    /// Calculate the number of mip levels for a given texture size
    pub fn full_mip_count(width: u32, height: u32) -> u32 {
        let max_dimension = width.max(height).max(1);
        u32::BITS - max_dimension.leading_zeros()
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, String> {
        let expected = (width * height * 4) as usize;
        if data.len() != expected {
            return Err(format!(
                "expected {} bytes for {}x{} rgba8, got {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            mips: vec![data],
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let img =
            image::open(path).map_err(|e| format!("Failed to load image {:?}: {}", path, e))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Two-colour checkerboard, `cells` squares per side.
    pub fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let odd = ((x / cell) + (y / cell)) % 2 == 1;
                data.extend_from_slice(if odd { &b } else { &a });
            }
        }
        Self {
            width: size,
            height: size,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            mips: vec![data],
        }
    }

    /// Vertical horizon-to-zenith gradient used when no sky image is configured.
    pub fn sky_gradient(width: u32, height: u32) -> Self {
        let horizon = [0.85f32, 0.9, 1.0];
        let zenith = [0.25f32, 0.45, 0.85];
        let ground = [0.3f32, 0.28, 0.25];
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let t = y as f32 / (height.max(2) - 1) as f32;
            let color = if t < 0.5 {
                let k = t * 2.0;
                [0usize, 1, 2].map(|c| zenith[c] + (horizon[c] - zenith[c]) * k)
            } else {
                ground
            };
            for _ in 0..width {
                data.extend(color.iter().map(|c| (c * 255.0) as u8));
                data.push(255);
            }
        }
        Self {
            width,
            height,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            mips: vec![data],
        }
    }

    /// Rebuilds the full mip chain from the base level with a 2x2 box filter.
    pub fn with_mips(mut self) -> Self {
        self.mips.truncate(1);
        let levels = Self::full_mip_count(self.width, self.height);
        let (mut w, mut h) = (self.width, self.height);
        for _ in 1..levels {
            let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
            let src = &self.mips[self.mips.len() - 1];
            let mut dst = Vec::with_capacity((nw * nh * 4) as usize);
            for y in 0..nh {
                for x in 0..nw {
                    for c in 0..4 {
                        let mut sum = 0u32;
                        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                            let sx = (x * 2 + dx).min(w - 1);
                            let sy = (y * 2 + dy).min(h - 1);
                            sum += src[((sy * w + sx) * 4 + c) as usize] as u32;
                        }
                        dst.push((sum / 4) as u8);
                    }
                }
            }
            self.mips.push(dst);
            w = nw;
            h = nh;
        }
        self
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }

    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    /// Row pitch of mip `level`, sized by the texel of `format`.
    pub fn bytes_per_row(&self, level: u32) -> u32 {
        let texel = self.format.block_copy_size(None).unwrap_or(4);
        self.mip_size(level).0 * texel
    }

    pub fn describe(&self) -> String {
        format!(
            "{}x{} {:?} with {} mips",
            self.width,
            self.height,
            self.format,
            self.mip_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_matches_largest_dimension() {
        assert_eq!(TextureData::full_mip_count(1, 1), 1);
        assert_eq!(TextureData::full_mip_count(64, 16), 7);
        assert_eq!(TextureData::full_mip_count(0, 0), 1);
    }

    #[test]
    fn with_mips_builds_every_level() {
        let tex = TextureData::checker(8, 2, [255; 4], [0, 0, 0, 255]).with_mips();
        assert_eq!(tex.mip_count(), 4);
        for level in 0..tex.mip_count() {
            let (w, h) = tex.mip_size(level);
            assert_eq!(tex.mips[level as usize].len(), (w * h * 4) as usize);
        }
        // last level averages the whole checkerboard
        assert_eq!(tex.mips[3][0], 127);
    }

    #[test]
    fn row_pitch_follows_the_format() {
        let mut tex = TextureData::checker(8, 2, [255; 4], [0, 0, 0, 255]).with_mips();
        assert_eq!(tex.bytes_per_row(0), 32);
        assert_eq!(tex.bytes_per_row(2), 8);

        tex.format = wgpu::TextureFormat::Rgba32Float;
        assert_eq!(tex.bytes_per_row(0), 128);
        assert_eq!(tex.bytes_per_row(3), 16);
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::from_rgba8(2, 2, vec![0; 16]).is_ok());
    }
}
