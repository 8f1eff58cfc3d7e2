use crate::app::rendering::Canvas;

pub const DIGIT_GLYPH_WIDTH: i32 = 3;
pub const DIGIT_GLYPH_HEIGHT: i32 = 5;
pub const HANGUL_GLYPH_SIZE: i32 = 8;

/// Draws a clock string ("HH:MM") with the 3x5 digit face. Characters
/// without a glyph advance the cursor like a space.
pub fn draw_clock_text(
    canvas: &mut Canvas<'_>,
    text: &str,
    left: i32,
    top: i32,
    pixel_scale: i32,
    color: [u8; 4],
) {
    let mut x = left;
    for ch in text.chars() {
        if let Some(rows) = digit_rows(ch) {
            canvas.draw_bitmap_glyph(&rows, DIGIT_GLYPH_WIDTH, x, top, pixel_scale, color);
        }
        x += (DIGIT_GLYPH_WIDTH + 1) * pixel_scale;
    }
}

pub fn draw_hangul_text(
    canvas: &mut Canvas<'_>,
    text: &str,
    left: i32,
    top: i32,
    pixel_scale: i32,
    color: [u8; 4],
) {
    let mut x = left;
    for ch in text.chars() {
        if let Some(rows) = hangul_rows(ch) {
            canvas.draw_bitmap_glyph(&rows, HANGUL_GLYPH_SIZE, x, top, pixel_scale, color);
        }
        x += (HANGUL_GLYPH_SIZE + 1) * pixel_scale;
    }
}

pub fn clock_text_width_px(text: &str, pixel_scale: i32) -> i32 {
    text_width_px(text.chars().count(), DIGIT_GLYPH_WIDTH, pixel_scale)
}

pub fn hangul_text_width_px(text: &str, pixel_scale: i32) -> i32 {
    text_width_px(text.chars().count(), HANGUL_GLYPH_SIZE, pixel_scale)
}

fn text_width_px(char_count: usize, glyph_width: i32, pixel_scale: i32) -> i32 {
    if char_count == 0 {
        return 0;
    }
    let advance = (glyph_width + 1) * pixel_scale;
    char_count as i32 * advance - pixel_scale
}

fn digit_rows(ch: char) -> Option<[u8; 5]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        _ => return None,
    };
    Some(rows)
}

// Hand-pixeled approximations of the syllables the word rain uses. Jamo are
// packed the way the composed block stacks them, which reads well enough at
// 8x8 once the glow passes soften the edges.
fn hangul_rows(ch: char) -> Option<[u8; 8]> {
    let rows = match ch {
        '사' => [
            0b0000_0010,
            0b0010_0010,
            0b0010_0010,
            0b0101_0011,
            0b0101_0010,
            0b1000_1010,
            0b1000_1010,
            0b0000_0010,
        ],
        '랑' => [
            0b1111_1010,
            0b0000_1010,
            0b1111_1011,
            0b1000_0010,
            0b1111_1010,
            0b0110_0000,
            0b1001_0000,
            0b0110_0000,
        ],
        '꿈' => [
            0b1110_1110,
            0b0010_0010,
            0b0010_0010,
            0b1111_1111,
            0b0001_1000,
            0b1111_1110,
            0b1000_0010,
            0b1111_1110,
        ],
        '빛' => [
            0b1010_0010,
            0b1010_0010,
            0b1110_0010,
            0b1010_0010,
            0b1110_0010,
            0b0001_0000,
            0b0111_1000,
            0b0100_1000,
        ],
        '밤' => [
            0b1010_0010,
            0b1010_0011,
            0b1110_0010,
            0b1110_0010,
            0b0000_0000,
            0b1111_1110,
            0b1000_0010,
            0b1111_1110,
        ],
        '하' => [
            0b0010_0010,
            0b1111_1010,
            0b0000_0010,
            0b0111_0011,
            0b0101_0010,
            0b0111_0010,
            0b0000_0010,
            0b0000_0010,
        ],
        '늘' => [
            0b1000_0000,
            0b1000_0000,
            0b1111_1000,
            0b1111_1111,
            0b0111_1110,
            0b0000_0010,
            0b0111_1110,
            0b0111_1110,
        ],
        '영' => [
            0b0110_0001,
            0b1001_0111,
            0b1001_0001,
            0b0110_0111,
            0b0000_0001,
            0b0001_1000,
            0b0010_0100,
            0b0001_1000,
        ],
        '원' => [
            0b0110_0001,
            0b1001_0001,
            0b0110_0111,
            0b1111_1001,
            0b0010_0001,
            0b0100_0000,
            0b0100_0000,
            0b0111_1110,
        ],
        _ => return None,
    };
    Some(rows)
}
