use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// logical CHIP-8 resolution
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// packed 1bpp image size; MSB of each byte is the leftmost pixel
pub const DISPLAY_SIZE_BYTES: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;

/// The 64x32 one-bit screen the interpreter XORs sprites onto. Each row is a
/// u64 with bit 63 as x = 0, so a packed row is just its big-endian bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    rows: [u64; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            rows: [0; DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.rows = [0; DISPLAY_HEIGHT];
    }

    /// XOR an 8-pixel-wide sprite onto the screen at (x, y), wrapping on both
    /// axes. Returns true if any lit pixel got switched off.
    pub fn blit(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let x = x as u32 % DISPLAY_WIDTH as u32;
        let y = y as usize % DISPLAY_HEIGHT;
        let mut collided = false;
        for (i, &bits) in sprite.iter().enumerate() {
            let row = &mut self.rows[(y + i) % DISPLAY_HEIGHT];
            let mask = ((bits as u64) << 56).rotate_right(x);
            collided |= *row & mask != 0;
            *row ^= mask;
        }
        collided
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let row = self.rows[y % DISPLAY_HEIGHT];
        (row >> (63 - x % DISPLAY_WIDTH)) & 1 == 1
    }

    /// the image in the packed form a [`Display`] draws
    pub fn to_bytes(&self) -> [u8; DISPLAY_SIZE_BYTES] {
        let mut out = [0u8; DISPLAY_SIZE_BYTES];
        for (chunk, row) in out.chunks_exact_mut(8).zip(self.rows.iter()) {
            chunk.copy_from_slice(&row.to_be_bytes());
        }
        out
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Display is used by the runtime to put the frame buffer on a screen. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    /// draw packed data based on internal resolution of display
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error>;

    /// how big the display data should be
    fn get_display_size_bytes(&self) -> usize;
}

// store useful metadata about the terminal: width, height, bitplanes
struct Resolution(usize, usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn byte_count(&self) -> usize {
        self.0 * self.1 * self.2 / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count();
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                if bit == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y, 1),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        if data.len() != self.resolution.byte_count() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "MonoTermDisplay wants {} bytes, got {}",
                    self.resolution.byte_count(),
                    data.len()
                ),
            ));
        }

        // expand each bitplane into x, y float coords, suitable for
        // rendering with TUI. this just prints blocky points for now
        let off: Vec<_> = self.resolution.bitplane_from_data(data, 0).collect();
        let on: Vec<_> = self.resolution.bitplane_from_data(data, 1).collect();
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let wanted = Rect::new(
            0,
            0,
            2 + self.resolution.0 as u16,
            2 + self.resolution.1 as u16,
        );

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = wanted.intersection(f.size());
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }

    fn get_display_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}

/// useful for testing non-display routines; remembers the last frame
pub struct DummyDisplay {
    pub last_frame: Vec<u8>,
    pub frames: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            last_frame: vec![0; DISPLAY_SIZE_BYTES],
            frames: 0,
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.last_frame.clear();
        self.last_frame.extend_from_slice(data);
        self.frames += 1;
        Ok(())
    }

    fn get_display_size_bytes(&self) -> usize {
        DISPLAY_SIZE_BYTES
    }
}
