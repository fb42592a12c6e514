#![doc = r#"
PPU phase state machine

Each scanline is a short chain of phases. `run_phase` performs the work of
one phase and returns `(next_phase, dots_until_next)`. Offsets below are the
dot at which a phase runs; `LineEnd` runs at dot 341 (dot 0 of the next
line), advances the scanline and picks the first phase of the new line.

| Lines    | Chain                                                                    |
|----------|--------------------------------------------------------------------------|
| 0..=239  | LineStart@0, RenderLine@256, SpriteFetch@257, BackgroundFetch@321        |
| 240      | PostRender@0                                                             |
| 241      | EnterVblank@1                                                            |
| 242..=260| VblankLine@0                                                             |
| 261      | PreRenderClear@1, PreRenderFetch@257, PreRenderScroll@280,               |
|          | PreRenderPrefetch@321, PreRenderEnd@339                                  |

Every chain ends in `LineEnd@341`, except that on an odd frame with rendering
enabled the pre-render line ends at dot 340.

Mapper hooks fire only while rendering is enabled, except `vblank_start` and
`frame_start`.
"#]

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LineStart,
    RenderLine,
    SpriteFetch,
    BackgroundFetch,
    LineEnd,
    PostRender,
    EnterVblank,
    VblankLine,
    PreRenderClear,
    PreRenderFetch,
    PreRenderScroll,
    PreRenderPrefetch,
    PreRenderEnd,
}

impl Phase {
    /// First phase of `scanline` and the dot it runs at.
    pub fn first_of_line(scanline: u16) -> (Phase, u32) {
        match scanline {
            0..=239 => (Phase::LineStart, 0),
            240 => (Phase::PostRender, 0),
            241 => (Phase::EnterVblank, 1),
            242..=260 => (Phase::VblankLine, 0),
            _ => (Phase::PreRenderClear, 1),
        }
    }
}

impl Ppu {
    pub(in crate::ppu) fn run_phase(
        &mut self,
        phase: Phase,
        mapper: &mut dyn Mapper,
        interrupts: &mut InterruptController,
    ) -> (Phase, u32) {
        let rendering = self.rendering_enabled();
        match phase {
            Phase::LineStart => {
                if rendering {
                    mapper.line_start(self.scanline);
                }
                (Phase::RenderLine, 256)
            }
            Phase::RenderLine => {
                self.render_line(mapper);
                if rendering {
                    self.increment_fine_y();
                    self.copy_horizontal();
                }
                (Phase::SpriteFetch, 1)
            }
            Phase::SpriteFetch => {
                if rendering {
                    mapper.sprite_memory_start();
                }
                (Phase::BackgroundFetch, 64)
            }
            Phase::BackgroundFetch => {
                if rendering {
                    mapper.background_memory_start();
                }
                (Phase::LineEnd, 20)
            }
            Phase::PostRender | Phase::VblankLine => (Phase::LineEnd, DOTS_PER_LINE),
            Phase::EnterVblank => {
                self.set_status(STATUS_VBLANK, true);
                self.frame_complete = true;
                self.frame_count += 1;
                if self.ctrl & CTRL_NMI != 0 {
                    interrupts.trigger_nmi();
                }
                mapper.vblank_start();
                (Phase::LineEnd, DOTS_PER_LINE - 1)
            }
            Phase::PreRenderClear => {
                self.set_status(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW, false);
                if rendering {
                    mapper.line_start(self.scanline);
                }
                (Phase::PreRenderFetch, 256)
            }
            Phase::PreRenderFetch => {
                if rendering {
                    self.copy_horizontal();
                    mapper.sprite_memory_start();
                }
                (Phase::PreRenderScroll, 23)
            }
            Phase::PreRenderScroll => {
                if rendering {
                    self.copy_vertical();
                }
                (Phase::PreRenderPrefetch, 41)
            }
            Phase::PreRenderPrefetch => {
                if rendering {
                    mapper.background_memory_start();
                }
                (Phase::PreRenderEnd, 18)
            }
            Phase::PreRenderEnd => {
                let skip = self.odd_frame && rendering;
                (Phase::LineEnd, if skip { 1 } else { 2 })
            }
            Phase::LineEnd => {
                self.dot = 0;
                if self.scanline == PRE_RENDER_LINE {
                    self.scanline = 0;
                    self.odd_frame = !self.odd_frame;
                    mapper.frame_start();
                } else {
                    self.scanline += 1;
                }
                Phase::first_of_line(self.scanline)
            }
        }
    }
}
