mod glyphs;

pub use glyphs::{
    clock_text_width_px, draw_clock_text, draw_hangul_text, hangul_text_width_px,
    DIGIT_GLYPH_HEIGHT, DIGIT_GLYPH_WIDTH, HANGUL_GLYPH_SIZE,
};
