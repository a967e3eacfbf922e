//! CPU height grids and the ping-pong pair that owns them.

use glam::Vec2;

/// One cell of the height field.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    pub height: f32,
    /// Height one step earlier; the solver derives velocity from it.
    pub prev_height: f32,
}

/// Square grid of cells, row-major, row 0 at the bottom of the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    resolution: usize,
    cells: Vec<Cell>,
}

impl HeightField {
    /// Flat, resting field.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            cells: vec![Cell::default(); resolution * resolution],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.resolution + x
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    pub fn set_height(&mut self, x: usize, y: usize, height: f32) {
        let idx = self.index(x, y);
        self.cells[idx].height = height;
    }

    /// Height at a possibly out-of-range coordinate, clamped to the nearest edge cell.
    #[inline]
    pub fn height_clamped(&self, x: i64, y: i64) -> f32 {
        let max = self.resolution as i64 - 1;
        let cx = x.clamp(0, max) as usize;
        let cy = y.clamp(0, max) as usize;
        self.cells[cy * self.resolution + cx].height
    }

    /// Bilinear height lookup at normalized coordinates, clamp-to-edge.
    ///
    /// At a cell centre this returns that cell's height exactly.
    pub fn sample_height(&self, uv: Vec2) -> f32 {
        let r = self.resolution as f32;
        let fx = uv.x * r - 0.5;
        let fy = uv.y * r - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let h00 = self.height_clamped(x0, y0);
        let h10 = self.height_clamped(x0 + 1, y0);
        let h01 = self.height_clamped(x0, y0 + 1);
        let h11 = self.height_clamped(x0 + 1, y0 + 1);

        let bottom = h00 + (h10 - h00) * tx;
        let top = h01 + (h11 - h01) * tx;
        bottom + (top - bottom) * ty
    }

    /// Normalized coordinate of a cell centre.
    #[inline]
    pub fn cell_uv(&self, x: usize, y: usize) -> Vec2 {
        let r = self.resolution as f32;
        Vec2::new((x as f32 + 0.5) / r, (y as f32 + 0.5) / r)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Interleaved `[height, prev_height]` pairs, the layout of the GPU buffers.
    pub fn to_interleaved(&self) -> Vec<[f32; 2]> {
        self.cells.iter().map(|c| [c.height, c.prev_height]).collect()
    }

    /// Build a field from interleaved pairs. Returns `None` if the length is not a square.
    pub fn from_interleaved(resolution: usize, data: &[[f32; 2]]) -> Option<Self> {
        if data.len() != resolution * resolution {
            return None;
        }
        Some(Self {
            resolution,
            cells: data
                .iter()
                .map(|&[height, prev_height]| Cell {
                    height,
                    prev_height,
                })
                .collect(),
        })
    }

    /// Largest absolute height in the field.
    pub fn peak_amplitude(&self) -> f32 {
        self.cells.iter().fold(0.0f32, |m, c| m.max(c.height.abs()))
    }

    /// Sum of squared heights.
    pub fn energy(&self) -> f64 {
        self.cells.iter().map(|c| (c.height as f64).powi(2)).sum()
    }
}

/// Which member of the pair a pass addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// Most recently completed state, read by propagation.
    Front,
    /// Written by propagation, read by shading, becomes front on swap.
    Back,
}

/// Index bookkeeping shared by the CPU pair and the GPU buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PingPong {
    front: usize,
}

impl PingPong {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot index (0 or 1) currently playing `role`.
    #[inline]
    pub fn slot(&self, role: BufferRole) -> usize {
        match role {
            BufferRole::Front => self.front,
            BufferRole::Back => 1 - self.front,
        }
    }

    /// Slots `(read, write)` of a pass reading `reads` and writing `writes`.
    ///
    /// # Panics
    /// If both name the same role.
    pub fn pass_slots(&self, reads: BufferRole, writes: BufferRole) -> (usize, usize) {
        assert_ne!(reads, writes, "a pass cannot write the buffer it reads");
        (self.slot(reads), self.slot(writes))
    }

    /// Exchange front and back.
    #[inline]
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }
}

/// Two equally sized fields with alternating read/write roles.
#[derive(Clone, Debug)]
pub struct FieldPair {
    fields: [HeightField; 2],
    roles: PingPong,
}

impl FieldPair {
    pub fn new(resolution: usize) -> Self {
        Self {
            fields: [HeightField::new(resolution), HeightField::new(resolution)],
            roles: PingPong::new(),
        }
    }

    pub fn resolution(&self) -> usize {
        self.fields[0].resolution()
    }

    pub fn get(&self, role: BufferRole) -> &HeightField {
        &self.fields[self.roles.slot(role)]
    }

    pub fn get_mut(&mut self, role: BufferRole) -> &mut HeightField {
        &mut self.fields[self.roles.slot(role)]
    }

    pub fn front(&self) -> &HeightField {
        self.get(BufferRole::Front)
    }

    pub fn back(&self) -> &HeightField {
        self.get(BufferRole::Back)
    }

    /// Borrow the `reads` field and the `writes` field at the same time.
    ///
    /// # Panics
    /// If both name the same role.
    pub fn split_roles(
        &mut self,
        reads: BufferRole,
        writes: BufferRole,
    ) -> (&HeightField, &mut HeightField) {
        let (read, _) = self.roles.pass_slots(reads, writes);
        let [a, b] = &mut self.fields;
        if read == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    pub fn swap(&mut self) {
        self.roles.swap();
    }

    pub fn roles(&self) -> PingPong {
        self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_reads_edge_value() {
        let mut field = HeightField::new(4);
        field.set_height(0, 2, 3.0);
        field.set_height(3, 3, -1.0);
        assert_eq!(field.height_clamped(-1, 2), 3.0);
        assert_eq!(field.height_clamped(-100, 2), 3.0);
        assert_eq!(field.height_clamped(4, 3), -1.0);
        assert_eq!(field.height_clamped(3, 4), -1.0);
    }

    #[test]
    fn test_sample_at_cell_centre_is_exact() {
        let mut field = HeightField::new(8);
        for y in 0..8 {
            for x in 0..8 {
                field.set_height(x, y, (x * 10 + y) as f32 * 0.1);
            }
        }
        for y in 0..8 {
            for x in 0..8 {
                let uv = field.cell_uv(x, y);
                let h = field.sample_height(uv);
                assert!((h - field.cell(x, y).height).abs() < 1e-5, "cell ({x},{y})");
            }
        }
    }

    #[test]
    fn test_sample_between_cells_interpolates() {
        let mut field = HeightField::new(2);
        field.set_height(1, 0, 1.0);
        field.set_height(1, 1, 1.0);
        // halfway between the two columns
        let h = field.sample_height(Vec2::new(0.5, 0.25));
        assert!((h - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pair_swap_exchanges_roles() {
        let mut pair = FieldPair::new(2);
        pair.get_mut(BufferRole::Back).set_height(0, 0, 7.0);
        assert_eq!(pair.back().cell(0, 0).height, 7.0);
        assert_eq!(pair.front().cell(0, 0).height, 0.0);
        pair.swap();
        assert_eq!(pair.front().cell(0, 0).height, 7.0);
        assert_eq!(pair.back().cell(0, 0).height, 0.0);
    }

    #[test]
    fn test_split_follows_roles() {
        let mut pair = FieldPair::new(2);
        pair.swap();
        {
            let (_front, back) = pair.split_roles(BufferRole::Front, BufferRole::Back);
            back.set_height(1, 1, 2.0);
        }
        assert_eq!(pair.back().cell(1, 1).height, 2.0);

        // reversed roles hand out front for writing
        {
            let (back, front) = pair.split_roles(BufferRole::Back, BufferRole::Front);
            assert_eq!(back.cell(1, 1).height, 2.0);
            front.set_height(0, 1, -1.0);
        }
        assert_eq!(pair.front().cell(0, 1).height, -1.0);
    }

    #[test]
    #[should_panic(expected = "cannot write the buffer it reads")]
    fn test_split_rejects_in_place_pass() {
        let mut pair = FieldPair::new(2);
        let _ = pair.split_roles(BufferRole::Back, BufferRole::Back);
    }

    #[test]
    fn test_pass_slots_follow_roles() {
        let mut roles = PingPong::new();
        let (front, back) = (BufferRole::Front, BufferRole::Back);
        assert_eq!(roles.pass_slots(front, back), (0, 1));
        roles.swap();
        assert_eq!(roles.pass_slots(front, back), (1, 0));
        assert_eq!(roles.pass_slots(back, front), (0, 1));
    }

    #[test]
    fn test_ping_pong_slots_never_alias() {
        let mut roles = PingPong::new();
        for _ in 0..4 {
            assert_ne!(roles.slot(BufferRole::Front), roles.slot(BufferRole::Back));
            roles.swap();
        }
    }

    #[test]
    fn test_interleaved_layout() {
        let mut field = HeightField::new(2);
        field.set(
            1,
            0,
            Cell {
                height: 1.0,
                prev_height: 2.0,
            },
        );
        let data = field.to_interleaved();
        assert_eq!(data[1], [1.0, 2.0]);
        assert_eq!(HeightField::from_interleaved(2, &data), Some(field));
        assert!(HeightField::from_interleaved(3, &data).is_none());
    }
}
