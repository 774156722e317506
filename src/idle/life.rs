//! Conway's Game of Life as idle content.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index::sample};
use tracing::debug;

use crate::{
    frame::{Frame, RGB8, colors},
    idle::Filler,
};

/// Colors for live cells, one per horizontal band from the top.
const ALIVE_COLORS: [RGB8; 7] = [
    colors::WHITE,
    colors::BLUE,
    colors::LIME,
    colors::CYAN,
    colors::MAGENTA,
    colors::YELLOW,
    colors::RED,
];

/// Generations with an unchanged population before the board is reseeded.
const STASIS_GENERATIONS: u8 = 15;

/// Game of Life on a non-wrapping board the size of the panel.
///
/// The board advances one generation every `generation_frames` calls to
/// [`next_frame`](Filler::next_frame), so at a 50 ms cadence the default of 4 gives 5
/// generations per second.
pub struct LifeFiller {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    generation_frames: u32,
    frames_shown: u32,
    // (generations without change, last live count)
    stasis_tracker: (u8, usize),
    rng: StdRng,
}

impl LifeFiller {
    /// Random board seeded from OS entropy.
    #[must_use]
    pub fn new(width: usize, height: usize, generation_frames: u32) -> Self {
        Self::with_rng(width, height, generation_frames, StdRng::from_entropy())
    }

    /// Reproducible board for a given seed.
    #[must_use]
    pub fn with_seed(width: usize, height: usize, generation_frames: u32, seed: u64) -> Self {
        Self::with_rng(width, height, generation_frames, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: usize, height: usize, generation_frames: u32, rng: StdRng) -> Self {
        let mut life = Self {
            width,
            height,
            cells: vec![false; width * height],
            generation_frames: generation_frames.max(1),
            frames_shown: 0,
            stasis_tracker: (0, 0),
            rng,
        };
        life.add_random();
        life
    }

    /// Number of live cells.
    #[must_use]
    pub fn live_cells(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    /// Whether the cell at `(x_index, y_index)` is alive.
    #[must_use]
    pub fn is_alive(&self, x_index: usize, y_index: usize) -> bool {
        x_index < self.width && y_index < self.height && self.cells[y_index * self.width + x_index]
    }

    /// Replace the board with exactly the given live cells. Cells off the board are ignored.
    pub fn set_cells(&mut self, alive: impl IntoIterator<Item = (usize, usize)>) {
        self.cells.fill(false);
        for (x_index, y_index) in alive {
            if x_index < self.width && y_index < self.height {
                self.cells[y_index * self.width + x_index] = true;
            }
        }
        self.stasis_tracker = (0, 0);
    }

    /// Replace the board with a fresh random population.
    pub fn add_random(&mut self) {
        self.cells.fill(false);
        let total = self.cells.len();
        if total == 0 {
            return;
        }
        let low = (self.width / 2).min(total);
        let high = (2 * total / 3).max(low);
        let alive = self.rng.gen_range(low..=high);
        for index in sample(&mut self.rng, total, alive) {
            self.cells[index] = true;
        }
        self.stasis_tracker = (0, 0);
        debug!(alive, "seeded life board");
    }

    /// Compute the next generation.
    pub fn step(&mut self) {
        let mut next_cells = vec![false; self.cells.len()];
        for y_index in 0..self.height {
            for x_index in 0..self.width {
                let live_neighbors = self.count_live_neighbors(x_index, y_index);
                next_cells[y_index * self.width + x_index] =
                    matches!((self.is_alive(x_index, y_index), live_neighbors), (true, 2 | 3) | (false, 3));
            }
        }
        self.cells = next_cells;

        let live_count = self.live_cells();
        let (unchanged_count, last_count) = self.stasis_tracker;
        if live_count == last_count {
            self.stasis_tracker = (unchanged_count + 1, live_count);
            if unchanged_count + 1 >= STASIS_GENERATIONS {
                debug!(live_count, "life board in stasis, reseeding");
                self.add_random();
            }
        } else {
            self.stasis_tracker = (1, live_count);
        }
    }

    // Cells past the edges count as dead.
    fn count_live_neighbors(&self, x_index: usize, y_index: usize) -> u8 {
        let mut count = 0;
        for y_offset in [-1isize, 0, 1] {
            for x_offset in [-1isize, 0, 1] {
                if x_offset == 0 && y_offset == 0 {
                    continue;
                }
                let (Some(x), Some(y)) = (
                    x_index.checked_add_signed(x_offset),
                    y_index.checked_add_signed(y_offset),
                ) else {
                    continue;
                };
                if self.is_alive(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    fn to_frame(&self) -> Frame {
        let band_height = self.height.div_ceil(ALIVE_COLORS.len()).max(1);
        let mut frame = Frame::new(self.width, self.height);
        for y_index in 0..self.height {
            let color = ALIVE_COLORS[(y_index / band_height) % ALIVE_COLORS.len()];
            for x_index in 0..self.width {
                if self.is_alive(x_index, y_index) {
                    frame[(x_index, y_index)] = color;
                }
            }
        }
        frame
    }
}

impl Filler for LifeFiller {
    fn name(&self) -> &'static str {
        "life"
    }

    fn next_frame(&mut self) -> Frame {
        if self.frames_shown > 0 && self.frames_shown % self.generation_frames == 0 {
            self.step();
        }
        self.frames_shown = self.frames_shown.wrapping_add(1);
        self.to_frame()
    }
}
