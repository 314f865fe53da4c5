use std::io::{self, IsTerminal};

use nu_ansi_term::Style;

pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        pub const TEXT: Color = Color::Rgb(205, 214, 244);
        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const PEACH: Color = Color::Rgb(250, 179, 135);
    }
}

/// Styles used when printing diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub error: Style,
    pub context: Style,
    pub caret: Style,
}

impl Palette {
    pub fn plain() -> Self {
        Self {
            error: Style::new(),
            context: Style::new(),
            caret: Style::new(),
        }
    }

    pub fn catppuccin_mocha() -> Self {
        use catppuccin::Mocha;
        Self {
            error: Style::new().bold().fg(Mocha::RED),
            context: Style::new().fg(Mocha::TEXT),
            caret: Style::new().bold().fg(Mocha::PEACH),
        }
    }

    /// Colored when stderr is a terminal and `NO_COLOR` is unset.
    pub fn for_stderr() -> Self {
        if io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
            Self::catppuccin_mocha()
        } else {
            Self::plain()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_palette_adds_no_escape_codes() {
        let palette = Palette::plain();
        assert_eq!(palette.error.paint("boom").to_string(), "boom");
    }

    #[test]
    fn mocha_palette_is_colored() {
        let palette = Palette::catppuccin_mocha();
        assert!(palette.error.paint("boom").to_string().contains("\u{1b}["));
    }
}
