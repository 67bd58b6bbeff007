// present.rs — Terminal presentation.
//
// Draws the frame buffer into whatever terminal size is current, then
// sleeps the frame delay and polls once for a key:
//
//   terminal row = x * rows / S       (frame buffer first index)
//   terminal col = y * cols / S       (frame buffer second index)
//
// Several grid cells may land on one terminal cell when the terminal is
// smaller than S×S; the last one drawn wins, as in any overdraw.
//
// The terminal is put into raw mode on the alternate screen with the cursor
// hidden; `Drop` undoes all three, so an early return or a panic unwinding
// through `main` still leaves the shell usable.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::{cursor, execute, queue, style, terminal};
use log::warn;

use crate::raster::FrameBuffer;

/// Key that stops the animation.
pub const QUIT_KEY: char = 'q';

/// Map a frame-buffer cell to a terminal cell.
///
/// `grid` is the frame buffer side length, `(cols, rows)` the terminal size.
#[inline]
pub fn scale_cell(x: usize, y: usize, grid: usize, cols: u16, rows: u16) -> (u16, u16) {
    let row = x * rows as usize / grid;
    let col = y * cols as usize / grid;
    (col as u16, row as u16)
}

/// Owns the terminal while the animation runs.
pub struct TerminalPresenter {
    out: Stdout,
    delay: Duration,
}

impl TerminalPresenter {
    /// Enter raw mode and the alternate screen.
    pub fn new(delay: Duration) -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(TerminalPresenter { out, delay })
    }

    /// Draw one frame, wait, and poll for the quit key.
    ///
    /// Returns `true` when the user asked to stop.
    pub fn present(&mut self, frame: &FrameBuffer) -> io::Result<bool> {
        let (cols, rows) = terminal::size()?;
        let grid = frame.size();

        queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        for (x, y, glyph) in frame.lit_cells() {
            let (col, row) = scale_cell(x, y, grid, cols, rows);
            queue!(self.out, cursor::MoveTo(col, row), style::Print(glyph.as_char()))?;
        }
        self.out.flush()?;

        std::thread::sleep(self.delay);
        self.poll_quit()
    }

    /// Drain pending events without blocking; `true` if the quit key was seen.
    fn poll_quit(&mut self) -> io::Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(KeyEvent { code: KeyCode::Char(c), kind, .. }) = event::read()? {
                if c == QUIT_KEY && kind != KeyEventKind::Release {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalPresenter {
    fn drop(&mut self) {
        let restored = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen)
            .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            warn!("failed to restore terminal: {e}");
        }
    }
}
