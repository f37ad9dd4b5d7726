//! Menu bar tree: categories of named actions.

use crate::action::Action;

/// One menu entry.
#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: Action,
}

/// A titled column of entries.
#[derive(Debug, Clone, Copy)]
pub struct MenuCategory {
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

/// The full menu tree.
pub const MENU: &[MenuCategory] = &[
    MenuCategory {
        title: "Left",
        items: &[
            MenuItem { label: "Sort order", action: Action::CycleSort },
            MenuItem { label: "View mode", action: Action::CycleView },
            MenuItem { label: "Refresh", action: Action::Refresh },
            MenuItem { label: "Same as other panel", action: Action::SameDir },
        ],
    },
    MenuCategory {
        title: "Files",
        items: &[
            MenuItem { label: "View", action: Action::View },
            MenuItem { label: "Copy", action: Action::Copy },
            MenuItem { label: "Move", action: Action::Move },
            MenuItem { label: "Rename", action: Action::Rename },
            MenuItem { label: "Make directory", action: Action::Mkdir },
            MenuItem { label: "Delete", action: Action::Delete },
            MenuItem { label: "Delete permanently", action: Action::DeletePermanent },
        ],
    },
    MenuCategory {
        title: "Commands",
        items: &[
            MenuItem { label: "Find file", action: Action::Find },
            MenuItem { label: "Select group", action: Action::GroupSelect },
            MenuItem { label: "Unselect group", action: Action::GroupDeselect },
            MenuItem { label: "Invert selection", action: Action::InvertSelection },
            MenuItem { label: "Swap panels", action: Action::SwapPanels },
            MenuItem { label: "Undo", action: Action::Undo },
            MenuItem { label: "Redo", action: Action::Redo },
        ],
    },
    MenuCategory {
        title: "Options",
        items: &[
            MenuItem { label: "Configuration", action: Action::OpenConfig },
            MenuItem { label: "Show hidden files", action: Action::ToggleHidden },
            MenuItem { label: "Next theme", action: Action::CycleTheme },
            MenuItem { label: "Help", action: Action::Help },
            MenuItem { label: "Quit", action: Action::Quit },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_has_categories_with_items() {
        assert!(MENU.len() >= 4);
        for category in MENU {
            assert!(!category.items.is_empty(), "{} is empty", category.title);
        }
    }
}
