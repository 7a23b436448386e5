use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles of the CLI. Plain when stdout is not a terminal or `NO_COLOR` is set.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub accent: Style,
    pub success: Style,
    pub warn: Style,
    pub error: Style,
    pub dim: Style,
    /// Routes a method serves
    pub endpoint: Style,
    /// Routes a method calls through a client interface
    pub client: Style,
}

impl Theme {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            Self::plain()
        } else {
            Self::colored()
        }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().bold(),
            accent: Style::new().blue().bold(),
            success: Style::new().green(),
            warn: Style::new().yellow().bold(),
            error: Style::new().red().bold(),
            dim: Style::new().dimmed(),
            endpoint: Style::new().green(),
            client: Style::new().cyan(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            header: none,
            accent: none,
            success: none,
            warn: none,
            error: none,
            dim: none,
            endpoint: none,
            client: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
