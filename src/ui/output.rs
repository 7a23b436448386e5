//! Line output of the CLI.
//!
//! Status lines go to stdout and are dropped in quiet mode; warnings and errors
//! always reach stderr.

use crate::entity::RouteKind;
use crate::ui::theme;
use owo_colors::OwoColorize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Set by `MICROSCOPE_QUIET=1` (or `true`/`yes`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| parse_quiet(std::env::var("MICROSCOPE_QUIET").ok().as_deref()))
}

fn parse_quiet(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(v) => v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"),
        None => false,
    }
}

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", "==>".style(theme().accent), text.style(theme().header));
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("{}", title.style(theme().header));
}

/// `label: value`, label dimmed
pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("    {} {}", format!("{label}:").style(theme().dim), value);
}

pub fn success(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", " ok".style(theme().success), text);
}

pub fn warn(text: &str) {
    eprintln!("{} {}", "warn".style(theme().warn), text);
}

pub fn error(text: &str) {
    eprintln!("{} {}", "error".style(theme().error), text);
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim).to_string()
}

/// One route attached to a method, e.g. `endpoint  GET /v1/orders  method:...`
pub fn route_row(kind: RouteKind, route: &str, method_key: &str) {
    if is_quiet() {
        return;
    }
    let style = match kind {
        RouteKind::Endpoint => theme().endpoint,
        RouteKind::RetrofitClient => theme().client,
    };
    println!("  {:<15} {}  {}", kind.as_str().style(style), route, dim(method_key));
}

/// A source file the scan could not read or parse
pub fn skipped(path: &str) {
    warn(&format!("skipped {}", path));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quiet() {
        assert!(parse_quiet(Some("1")));
        assert!(parse_quiet(Some("TRUE")));
        assert!(parse_quiet(Some(" yes ")));
        assert!(!parse_quiet(Some("0")));
        assert!(!parse_quiet(Some("")));
        assert!(!parse_quiet(None));
    }
}
