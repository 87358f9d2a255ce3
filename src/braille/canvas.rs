use ratatui::style::Color;

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots) and carries a
/// single foreground colour: the pen colour of the last dot set in it.
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    pixels: Vec<Vec<u8>>,
    colors: Vec<Vec<Option<Color>>>,
    pen: Color,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![vec![0u8; width]; height],
            colors: vec![vec![None; width]; height],
            pen: Color::Reset,
        }
    }

    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Colour used by subsequent `set_pixel` calls
    pub fn set_pen(&mut self, color: Color) {
        self.pen = color;
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        self.pixels[cy][cx] |= bit;
        self.colors[cy][cx] = Some(self.pen);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.pixels
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Non-empty cells of one row as `(column, glyph, colour)`
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, char, Color)> + '_ {
        let cells = self.pixels.get(row).map(|r| r.as_slice()).unwrap_or(&[]);
        let colors = self.colors.get(row).map(|r| r.as_slice()).unwrap_or(&[]);
        cells
            .iter()
            .zip(colors)
            .enumerate()
            .filter(|(_, (bits, _))| **bits != 0)
            .map(|(col, (&bits, color))| {
                let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                (col, ch, color.unwrap_or(Color::Reset))
            })
    }

    pub fn height(&self) -> usize {
        self.height
    }
}
