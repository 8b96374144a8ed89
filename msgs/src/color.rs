use session::Classification;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const YELLOW: Color = Color::rgb(1.0, 0.92, 0.016);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b, a: 1.0 }
    }

    /// 24-bit foreground escape sequence for terminals.
    pub fn ansi_foreground(&self) -> String {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("\x1b[38;2;{};{};{}m", channel(self.r), channel(self.g), channel(self.b))
    }
}

impl From<Classification> for Color {
    fn from(classification: Classification) -> Color {
        match classification {
            Classification::Exact => Color::YELLOW,
            Classification::Close => Color::GREEN,
            Classification::Far => Color::RED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_colors() {
        assert_eq!(Color::from(Classification::Exact), Color::YELLOW);
        assert_eq!(Color::from(Classification::Far).ansi_foreground(), "\x1b[38;2;255;0;0m");
    }
}
