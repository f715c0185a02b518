//! PS1 public interface and main loop

use crate::bus::Bus;
use crate::cd::CdController;
use crate::cd::{CdRom, CdRomError};
use crate::cpu::R3000;
use crate::dma::DmaController;
use crate::event_manager::{EventHandle, EventManager};
use crate::gpu::Gpu;
use crate::input::Ps1Inputs;
use crate::interrupts::{InterruptRegisters, InterruptType};
use crate::memory::Memory;
use crate::memory_control::MemoryControl;
use crate::sio::SerialPort;
use crate::spu::Spu;
use crate::timers::Timers;
use bincode::{Decode, Encode};
use thiserror::Error;

pub use crate::gpu::renderer::Renderer;

pub trait AudioOutput {
    type Err;

    /// # Errors
    ///
    /// Should propagate any error encountered while queueing the samples.
    fn queue_samples(&mut self, samples: &[(f64, f64)]) -> Result<(), Self::Err>;
}

#[derive(Debug, Error)]
pub enum Ps1Error {
    #[error("Incorrect BIOS ROM size; expected 512KB, was {bios_len}")]
    IncorrectBiosSize { bios_len: usize },
    #[error("EXE format is invalid")]
    InvalidExeFormat,
}

pub type Ps1Result<T> = Result<T, Ps1Error>;

#[derive(Debug, Error)]
pub enum TickError<RErr, AErr> {
    #[error("Error rendering frame: {0}")]
    Render(RErr),
    #[error("Error queueing audio samples: {0}")]
    Audio(AErr),
    #[error("CD-ROM error: {0}")]
    CdRom(#[from] CdRomError),
}

#[derive(Debug, Encode, Decode)]
pub struct Ps1Emulator {
    cpu: R3000,
    gpu: Gpu,
    spu: Spu,
    audio_buffer: Vec<(f64, f64)>,
    cd_controller: CdController,
    memory: Memory,
    memory_control: MemoryControl,
    dma_controller: DmaController,
    interrupt_registers: InterruptRegisters,
    sio0: SerialPort,
    timers: Timers,
    event_manager: EventManager,
    spu_and_cd_clock_event: EventHandle,
    total_cpu_cycles: u64,
    last_render_cycles: u64,
    tty_enabled: bool,
    tty_buffer: String,
}

#[derive(Debug)]
pub struct Ps1EmulatorBuilder {
    bios_rom: Vec<u8>,
    disc: Option<CdRom>,
    tty_enabled: bool,
}

impl Ps1EmulatorBuilder {
    #[must_use]
    pub fn new(bios_rom: Vec<u8>) -> Self {
        Self { bios_rom, disc: None, tty_enabled: false }
    }

    #[must_use]
    pub fn with_disc(mut self, disc: CdRom) -> Self {
        self.disc = Some(disc);
        self
    }

    #[must_use]
    pub fn tty_enabled(mut self, tty_enabled: bool) -> Self {
        self.tty_enabled = tty_enabled;
        self
    }

    /// # Errors
    ///
    /// Will return an error if the BIOS ROM is invalid.
    pub fn build(self) -> Ps1Result<Ps1Emulator> {
        Ps1Emulator::new(self.bios_rom, self.disc, self.tty_enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    None,
    FrameRendered,
}

// The SPU clock rate is exactly 1/768 the CPU clock rate
// This _should_ be 44100 Hz, but it may not be exactly depending on the exact oscillator speed
const SPU_CLOCK_DIVIDER: u64 = 768;

impl Ps1Emulator {
    #[must_use]
    pub fn builder(bios_rom: Vec<u8>) -> Ps1EmulatorBuilder {
        Ps1EmulatorBuilder::new(bios_rom)
    }

    /// # Errors
    ///
    /// Will return an error if the BIOS ROM is invalid.
    pub fn new(bios_rom: Vec<u8>, disc: Option<CdRom>, tty_enabled: bool) -> Ps1Result<Self> {
        let memory = Memory::new(bios_rom)?;

        let mut timers = Timers::new();
        let mut event_manager = EventManager::new();
        timers.init_events(&mut event_manager);
        let spu_and_cd_clock_event = event_manager.create_event("spu_and_cd_clock");

        let mut emulator = Self {
            cpu: R3000::new(),
            gpu: Gpu::new(),
            spu: Spu::new(),
            audio_buffer: Vec::with_capacity(1600),
            cd_controller: CdController::new(disc),
            memory,
            memory_control: MemoryControl::new(),
            dma_controller: DmaController::new(),
            interrupt_registers: InterruptRegisters::new(),
            sio0: SerialPort::new(),
            timers,
            event_manager,
            spu_and_cd_clock_event,
            total_cpu_cycles: 0,
            last_render_cycles: 0,
            tty_enabled,
            tty_buffer: String::new(),
        };
        emulator.schedule_initial_events();

        Ok(emulator)
    }

    fn schedule_initial_events(&mut self) {
        self.timers.schedule_next_vblank(&mut self.event_manager);
        self.event_manager.schedule(self.spu_and_cd_clock_event, SPU_CLOCK_DIVIDER as i64);
    }

    #[inline]
    #[must_use]
    pub fn cpu_pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// # Errors
    ///
    /// Will return an error if the EXE does not appear to be a PS1 executable based on the header.
    #[allow(clippy::missing_panics_doc)]
    pub fn sideload_exe(&mut self, exe: &[u8]) -> Ps1Result<()> {
        if exe.len() < 0x800 || &exe[..0x008] != "PS-X EXE".as_bytes() {
            return Err(Ps1Error::InvalidExeFormat);
        }

        let pc = u32::from_le_bytes(exe[0x010..0x014].try_into().unwrap());
        let initial_gp = u32::from_le_bytes(exe[0x014..0x018].try_into().unwrap());
        let ram_dest_addr = u32::from_le_bytes(exe[0x018..0x01C].try_into().unwrap());
        let exe_size = u32::from_le_bytes(exe[0x01C..0x020].try_into().unwrap());
        let initial_sp = u32::from_le_bytes(exe[0x030..0x034].try_into().unwrap());
        let initial_sp_offset = u32::from_le_bytes(exe[0x034..0x038].try_into().unwrap());

        self.cpu.set_pc(pc);
        self.cpu.set_gpr(28, initial_gp);

        if initial_sp != 0 {
            self.cpu.set_gpr(29, initial_sp);
            self.cpu.set_gpr(30, initial_sp);
        }

        if initial_sp_offset != 0 {
            for r in [29, 30] {
                let r_value = self.cpu.get_gpr(r);
                self.cpu.set_gpr(r, r_value.wrapping_add(initial_sp_offset));
            }
        }

        let exe_data = &exe[0x800..0x800 + exe_size as usize];
        self.memory.copy_to_main_ram(exe_data, ram_dest_addr & 0x1FFFFFFF);

        Ok(())
    }

    /// # Errors
    ///
    /// Will propagate any error encountered while rendering a frame.
    #[inline]
    pub fn tick<R: Renderer, A: AudioOutput>(
        &mut self,
        inputs: Ps1Inputs,
        renderer: &mut R,
        audio_output: &mut A,
    ) -> Result<TickEffect, TickError<R::Err, A::Err>> {
        self.cpu.execute_instruction(&mut Bus {
            gpu: &mut self.gpu,
            spu: &mut self.spu,
            cd_controller: &mut self.cd_controller,
            memory: &mut self.memory,
            memory_control: &mut self.memory_control,
            dma_controller: &mut self.dma_controller,
            interrupt_registers: &mut self.interrupt_registers,
            sio0: &mut self.sio0,
            timers: &mut self.timers,
            event_manager: &mut self.event_manager,
        });

        if self.tty_enabled {
            self.check_for_putchar_call();
        }

        // Very, very rough timing: Assume that the CPU takes on average 2 cycles/instruction.
        // On actual hardware, timing varies depending on what memory was accessed (if any),
        // whether the opcode read hit in I-cache, and whether the instruction wrote to memory
        // while the write queue was full.
        let cpu_cycles: i64 = 2;

        self.event_manager.add_cycles(cpu_cycles);
        self.total_cpu_cycles += cpu_cycles as u64;

        // TODO use the event manager instead of advancing SIO0 every CPU tick
        self.sio0.tick(cpu_cycles as u32, inputs, &mut self.interrupt_registers);

        let tick_effect = self.process_events(renderer, audio_output)?;

        if self.total_cpu_cycles - self.last_render_cycles >= 33_868_800 / 30 {
            // Force a frame render
            self.render_frame(renderer, audio_output)?;
            return Ok(TickEffect::FrameRendered);
        }

        Ok(tick_effect)
    }

    fn render_frame<R: Renderer, A: AudioOutput>(
        &mut self,
        renderer: &mut R,
        audio_output: &mut A,
    ) -> Result<(), TickError<R::Err, A::Err>> {
        self.last_render_cycles = self.total_cpu_cycles;

        self.gpu.render_frame(renderer).map_err(TickError::Render)?;

        audio_output.queue_samples(&self.audio_buffer).map_err(TickError::Audio)?;
        self.audio_buffer.clear();

        Ok(())
    }

    fn process_events<R: Renderer, A: AudioOutput>(
        &mut self,
        renderer: &mut R,
        audio_output: &mut A,
    ) -> Result<TickEffect, TickError<R::Err, A::Err>> {
        let mut tick_effect = TickEffect::None;

        while let Some((handle, _elapsed)) = self.event_manager.update_next_event() {
            if handle == self.timers.vblank_event() {
                self.interrupt_registers.set_interrupt_flag(InterruptType::VBlank);
                self.gpu.on_vblank();
                self.timers.schedule_next_vblank(&mut self.event_manager);

                self.render_frame(renderer, audio_output)?;

                tick_effect = TickEffect::FrameRendered;
            } else if handle == self.spu_and_cd_clock_event {
                self.cd_controller.clock(&mut self.interrupt_registers)?;
                self.audio_buffer.push(self.spu.clock(&self.cd_controller));

                self.event_manager.schedule(self.spu_and_cd_clock_event, SPU_CLOCK_DIVIDER as i64);
            } else if handle == self.timers.timer_event(0) {
                self.interrupt_registers.set_interrupt_flag(InterruptType::Timer0);
                self.timers.schedule_next_timer_0_irq(&mut self.event_manager);
            } else if handle == self.timers.timer_event(1) {
                self.interrupt_registers.set_interrupt_flag(InterruptType::Timer1);
                self.timers.schedule_next_timer_1_irq(&mut self.event_manager);
            } else if handle == self.timers.timer_event(2) {
                self.interrupt_registers.set_interrupt_flag(InterruptType::Timer2);
                self.timers.schedule_next_timer_2_irq(&mut self.event_manager);
            }
        }

        Ok(tick_effect)
    }

    fn check_for_putchar_call(&mut self) {
        // BIOS function calls work by jumping to $A0 (A functions), $B0 (B functions), or
        // $C0 (C functions) with the function number specified in R9.
        //
        // A($3C) and B($3D) are both the putchar() function, which prints the ASCII character
        // in R4 to the TTY.
        let pc = self.cpu.pc() & 0x1FFFFFFF;
        let r9 = self.cpu.get_gpr(9);
        if (pc == 0xA0 && r9 == 0x3C) || (pc == 0xB0 && r9 == 0x3D) {
            let r4 = self.cpu.get_gpr(4);
            let c = r4 as u8 as char;
            if c == '\n' {
                println!("TTY: {}", self.tty_buffer);
                self.tty_buffer.clear();
            } else {
                self.tty_buffer.push(c);
            }
        }
    }

    #[must_use]
    pub fn take_disc(&mut self) -> Option<CdRom> {
        self.cd_controller.take_disc()
    }

    pub fn set_disc(&mut self, disc: Option<CdRom>) {
        self.cd_controller.set_disc(disc);
    }
}
