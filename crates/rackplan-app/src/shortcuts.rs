//! Keyboard shortcut registry and documentation.

use rackplan_core::Key;

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: Key,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, action: Key, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Delete", false, false, Key::Delete, "Delete selection"),
            Shortcut::new("Backspace", false, false, Key::Delete, "Delete selection"),
            Shortcut::new("Escape", false, false, Key::Escape, "Cancel drag or clear selection"),
            Shortcut::new("+", false, false, Key::ZoomIn, "Zoom in"),
            Shortcut::new("=", false, false, Key::ZoomIn, "Zoom in"),
            Shortcut::new("-", false, false, Key::ZoomOut, "Zoom out"),
            Shortcut::new("Z", true, false, Key::Undo, "Undo"),
            Shortcut::new("Z", true, true, Key::Redo, "Redo"),
            Shortcut::new("Y", true, false, Key::Redo, "Redo"),
        ]
    }

    /// Map a key name such as `"Ctrl+Z"` or `"+"` to its action.
    /// Matching ignores case and modifier order.
    pub fn resolve(name: &str) -> Option<Key> {
        let mut rest = name.trim();
        let mut ctrl = false;
        let mut shift = false;
        loop {
            let lower = rest.to_ascii_lowercase();
            if let Some(tail) = lower.strip_prefix("ctrl+") {
                ctrl = true;
                rest = &rest[rest.len() - tail.len()..];
            } else if let Some(tail) = lower.strip_prefix("shift+") {
                shift = true;
                rest = &rest[rest.len() - tail.len()..];
            } else {
                break;
            }
        }

        Self::all()
            .into_iter()
            .find(|s| s.ctrl == ctrl && s.shift == shift && s.key.eq_ignore_ascii_case(rest))
            .map(|s| s.action)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}
