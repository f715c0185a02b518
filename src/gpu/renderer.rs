//! Renderer interface: the set of draw-call operations the GPU issues to a
//! host-provided renderer, plus the command queue used to defer and batch
//! them to once per frame.
//!
//! The GPU keeps its own VRAM buffer for blit operations (fills, CPU<->VRAM
//! transfers, VRAM-to-VRAM copies) so that CPU reads back correct data
//! without needing a round trip through the host. Triangle/line/rectangle
//! primitives are not rasterized locally; they are recorded and handed to
//! the renderer, which owns the actual pixel output.

use bincode::{Decode, Encode};

/// A drawing vertex: signed 11-bit position, 24-bit RGB, 8-bit (u, v),
/// 15-bit CLUT index, and a 9-bit texture-page attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub u: u8,
    pub v: u8,
    pub clut: u16,
    pub texpage: u16,
}

pub trait Renderer {
    type Err;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_draw_area(&mut self, left: i32, top: i32, right: i32, bottom: i32)
        -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_display_start(&mut self, x: u32, y: u32) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_display_size(&mut self, width: u32, height: u32) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_texture_window(
        &mut self,
        mask_x: u32,
        mask_y: u32,
        offset_x: u32,
        offset_y: u32,
    ) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_draw_mode(&mut self, texpage: u16, clut: u16, dither: bool) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_semi_transparency_mode(&mut self, mode: u8) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn set_mask_bits(&mut self, force: bool, check: bool) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn update_vram(
        &mut self,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        pixels: &[u16],
    ) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn read_vram(
        &mut self,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        out_pixels: &mut [u16],
    ) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn fill_vram(
        &mut self,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        r: u8,
        g: u8,
        b: u8,
        a: u8,
    ) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn copy_vram(
        &mut self,
        src_x: u32,
        src_y: u32,
        dst_x: u32,
        dst_y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn push_triangle(&mut self, vertices: [Vertex; 3], semi_transparent: bool)
        -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn push_quad(&mut self, vertices: [Vertex; 4], semi_transparent: bool) -> Result<(), Self::Err>;

    /// # Errors
    ///
    /// Should propagate any error encountered while applying the call.
    fn display_frame(&mut self) -> Result<(), Self::Err>;
}

/// A recorded renderer call, queued by the GPU and replayed against a
/// concrete [`Renderer`] once per draw batch.
#[derive(Debug, Clone, Encode, Decode)]
pub enum RendererCommand {
    SetDrawArea { left: i32, top: i32, right: i32, bottom: i32 },
    SetDisplayStart { x: u32, y: u32 },
    SetDisplaySize { width: u32, height: u32 },
    SetTextureWindow { mask_x: u32, mask_y: u32, offset_x: u32, offset_y: u32 },
    SetDrawMode { texpage: u16, clut: u16, dither: bool },
    SetSemiTransparencyMode { mode: u8 },
    SetMaskBits { force: bool, check: bool },
    UpdateVram { left: u32, top: u32, width: u32, height: u32, pixels: Vec<u16> },
    FillVram { left: u32, top: u32, width: u32, height: u32, r: u8, g: u8, b: u8, a: u8 },
    CopyVram { src_x: u32, src_y: u32, dst_x: u32, dst_y: u32, width: u32, height: u32 },
    PushTriangle { vertices: [Vertex; 3], semi_transparent: bool },
    PushQuad { vertices: [Vertex; 4], semi_transparent: bool },
}

impl RendererCommand {
    /// # Errors
    ///
    /// Propagates whatever error the underlying renderer call returns.
    pub fn replay<R: Renderer>(self, renderer: &mut R) -> Result<(), R::Err> {
        match self {
            Self::SetDrawArea { left, top, right, bottom } => {
                renderer.set_draw_area(left, top, right, bottom)
            }
            Self::SetDisplayStart { x, y } => renderer.set_display_start(x, y),
            Self::SetDisplaySize { width, height } => renderer.set_display_size(width, height),
            Self::SetTextureWindow { mask_x, mask_y, offset_x, offset_y } => {
                renderer.set_texture_window(mask_x, mask_y, offset_x, offset_y)
            }
            Self::SetDrawMode { texpage, clut, dither } => {
                renderer.set_draw_mode(texpage, clut, dither)
            }
            Self::SetSemiTransparencyMode { mode } => renderer.set_semi_transparency_mode(mode),
            Self::SetMaskBits { force, check } => renderer.set_mask_bits(force, check),
            Self::UpdateVram { left, top, width, height, pixels } => {
                renderer.update_vram(left, top, width, height, &pixels)
            }
            Self::FillVram { left, top, width, height, r, g, b, a } => {
                renderer.fill_vram(left, top, width, height, r, g, b, a)
            }
            Self::CopyVram { src_x, src_y, dst_x, dst_y, width, height } => {
                renderer.copy_vram(src_x, src_y, dst_x, dst_y, width, height)
            }
            Self::PushTriangle { vertices, semi_transparent } => {
                renderer.push_triangle(vertices, semi_transparent)
            }
            Self::PushQuad { vertices, semi_transparent } => {
                renderer.push_quad(vertices, semi_transparent)
            }
        }
    }
}
