//! PS1 GPU (Graphics Processing Unit)

mod gp0;
mod gp1;
pub mod registers;
pub mod renderer;

use crate::event_manager::EventManager;
use crate::gpu::gp0::{Gp0CommandState, Gp0State};
use crate::gpu::registers::{Registers, VerticalResolution};
use crate::gpu::renderer::{Renderer, RendererCommand};
use crate::timers::Timers;
use bincode::{Decode, Encode};

const VRAM_LEN: usize = 1024 * 1024;

type Vram = [u8; VRAM_LEN];

/// CRT scan position, tracked only precisely enough to fill GPUSTAT's
/// even/odd line bit; scanline-level timing is otherwise approximated by
/// the vblank event in [`crate::timers`].
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct ClockState {
    pub line: u32,
    pub odd_frame: bool,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Gpu {
    vram: Box<Vram>,
    registers: Registers,
    gp0: Gp0State,
    gpu_read_buffer: u32,
    clock: ClockState,
    pending_commands: Vec<RendererCommand>,
}

impl Gpu {
    pub fn new() -> Self {
        Self {
            vram: vec![0; VRAM_LEN].into_boxed_slice().try_into().unwrap(),
            registers: Registers::new(),
            gp0: Gp0State::new(),
            gpu_read_buffer: 0,
            clock: ClockState::default(),
            pending_commands: Vec::new(),
        }
    }

    pub fn read_port(&mut self) -> u32 {
        if let Gp0CommandState::SendingToCpu(fields) = self.gp0.command_state {
            self.gpu_read_buffer = self.read_vram_word_for_cpu(fields);
        }

        self.gpu_read_buffer
    }

    pub fn read_status_register(&self) -> u32 {
        let status = self.registers.read_status(&self.gp0, &self.clock);
        log::trace!("GPU status register read: {status:08X}");
        status
    }

    pub fn write_gp0_command(&mut self, value: u32) {
        self.handle_gp0_write(value);
    }

    pub fn write_gp1_command(
        &mut self,
        value: u32,
        timers: &mut Timers,
        event_manager: &mut EventManager,
    ) {
        self.handle_gp1_write(value, timers, event_manager);
    }

    pub fn vram(&self) -> &[u8] {
        self.vram.as_ref()
    }

    /// Marks the start of a new field/frame: toggles the even/odd line bit
    /// used by GPUSTAT and flushes this batch's geometry settings into the
    /// renderer command queue.
    pub fn on_vblank(&mut self) {
        self.clock.odd_frame = !self.clock.odd_frame;
        self.clock.line = 0;
        self.queue_frame_geometry();
    }

    fn queue_frame_geometry(&mut self) {
        let (draw_x1, draw_y1) = self.gp0.draw_settings.draw_area_top_left;
        let (draw_x2, draw_y2) = self.gp0.draw_settings.draw_area_bottom_right;
        self.pending_commands.push(RendererCommand::SetDrawArea {
            left: draw_x1 as i32,
            top: draw_y1 as i32,
            right: draw_x2 as i32,
            bottom: draw_y2 as i32,
        });

        self.pending_commands.push(RendererCommand::SetDisplayStart {
            x: self.registers.display_area_x,
            y: self.registers.display_area_y,
        });

        let (x1, x2) = self.registers.x_display_range;
        let (y1, y2) = self.registers.y_display_range;
        let width = if x2 < x1 { 0 } else { (x2 - x1) / u32::from(self.registers.dot_clock_divider()) };
        let height = if y2 < y1 {
            0
        } else if self.registers.interlaced && self.registers.v_resolution == VerticalResolution::Double {
            (y2 - y1) * 2
        } else {
            y2 - y1
        };
        self.pending_commands.push(RendererCommand::SetDisplaySize { width, height });
    }

    /// Drains this batch's queued renderer calls, in the order they were
    /// recorded, for the caller to replay against a concrete [`Renderer`].
    #[must_use]
    pub fn take_pending_commands(&mut self) -> Vec<RendererCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    /// # Errors
    ///
    /// Propagates whatever error the renderer returns from any queued call
    /// or from `display_frame`.
    pub fn render_frame<R: Renderer>(&mut self, renderer: &mut R) -> Result<(), R::Err> {
        for command in self.take_pending_commands() {
            command.replay(renderer)?;
        }
        renderer.display_frame()
    }
}

impl Default for Gpu {
    fn default() -> Self {
        Self::new()
    }
}
