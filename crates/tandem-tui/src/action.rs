//! Named actions produced by the dispatcher.
//!
//! Every action has a stable string id used for keybinding overrides in
//! the config file.

/// Everything the dispatcher can ask the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Global
    Quit,
    SwitchPanel,
    Help,
    OpenMenu,
    OpenConfig,

    // Panel navigation
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    Home,
    End,
    Activate,
    Parent,
    HistoryBack,
    HistoryForward,
    Refresh,

    // Marks
    ToggleMark,
    ToggleMarkDown,
    GroupSelect,
    GroupDeselect,
    InvertSelection,
    SelectAllFiles,
    UnselectAll,

    // File operations
    View,
    Edit,
    Copy,
    Move,
    Mkdir,
    Delete,
    DeletePermanent,
    Rename,
    Undo,
    Redo,

    // Panel toggles
    Find,
    QuickView,
    ToggleHidden,
    CycleTheme,
    CycleSort,
    CycleView,
    SwapPanels,
    SameDir,

    // Dialog context (any modal surface except the menu)
    DialogConfirm,
    DialogCancel,
    DialogToggle,
    DialogUp,
    DialogDown,
    DialogLeft,
    DialogRight,

    // Menu context
    MenuActivate,
    MenuClose,
    MenuUp,
    MenuDown,
    MenuLeft,
    MenuRight,
}

impl Action {
    /// Stable identifier, as written in `[keybindings]`.
    pub fn id(self) -> &'static str {
        match self {
            Self::Quit => "global.quit",
            Self::SwitchPanel => "global.switch_panel",
            Self::Help => "global.help",
            Self::OpenMenu => "global.menu",
            Self::OpenConfig => "global.config",
            Self::CursorUp => "panel.cursor_up",
            Self::CursorDown => "panel.cursor_down",
            Self::PageUp => "panel.page_up",
            Self::PageDown => "panel.page_down",
            Self::Home => "panel.home",
            Self::End => "panel.end",
            Self::Activate => "panel.activate",
            Self::Parent => "panel.parent",
            Self::HistoryBack => "panel.history_back",
            Self::HistoryForward => "panel.history_forward",
            Self::Refresh => "panel.refresh",
            Self::ToggleMark => "panel.toggle_mark",
            Self::ToggleMarkDown => "panel.toggle_mark_down",
            Self::GroupSelect => "panel.group_select",
            Self::GroupDeselect => "panel.group_deselect",
            Self::InvertSelection => "panel.invert_selection",
            Self::SelectAllFiles => "panel.select_all",
            Self::UnselectAll => "panel.unselect_all",
            Self::View => "panel.view",
            Self::Edit => "panel.edit",
            Self::Copy => "panel.copy",
            Self::Move => "panel.move",
            Self::Mkdir => "panel.mkdir",
            Self::Delete => "panel.delete",
            Self::DeletePermanent => "panel.delete_permanent",
            Self::Rename => "panel.rename",
            Self::Undo => "panel.undo",
            Self::Redo => "panel.redo",
            Self::Find => "panel.find",
            Self::QuickView => "panel.quick_view",
            Self::ToggleHidden => "panel.toggle_hidden",
            Self::CycleTheme => "panel.cycle_theme",
            Self::CycleSort => "panel.cycle_sort",
            Self::CycleView => "panel.cycle_view",
            Self::SwapPanels => "panel.swap",
            Self::SameDir => "panel.same_dir",
            Self::DialogConfirm => "dialog.confirm",
            Self::DialogCancel => "dialog.cancel",
            Self::DialogToggle => "dialog.toggle",
            Self::DialogUp => "dialog.up",
            Self::DialogDown => "dialog.down",
            Self::DialogLeft => "dialog.left",
            Self::DialogRight => "dialog.right",
            Self::MenuActivate => "menu.activate",
            Self::MenuClose => "menu.close",
            Self::MenuUp => "menu.up",
            Self::MenuDown => "menu.down",
            Self::MenuLeft => "menu.left",
            Self::MenuRight => "menu.right",
        }
    }

    /// Every action, for override lookup by id.
    pub fn all() -> &'static [Action] {
        use Action::*;
        &[
            Quit,
            SwitchPanel,
            Help,
            OpenMenu,
            OpenConfig,
            CursorUp,
            CursorDown,
            PageUp,
            PageDown,
            Home,
            End,
            Activate,
            Parent,
            HistoryBack,
            HistoryForward,
            Refresh,
            ToggleMark,
            ToggleMarkDown,
            GroupSelect,
            GroupDeselect,
            InvertSelection,
            SelectAllFiles,
            UnselectAll,
            View,
            Edit,
            Copy,
            Move,
            Mkdir,
            Delete,
            DeletePermanent,
            Rename,
            Undo,
            Redo,
            Find,
            QuickView,
            ToggleHidden,
            CycleTheme,
            CycleSort,
            CycleView,
            SwapPanels,
            SameDir,
            DialogConfirm,
            DialogCancel,
            DialogToggle,
            DialogUp,
            DialogDown,
            DialogLeft,
            DialogRight,
            MenuActivate,
            MenuClose,
            MenuUp,
            MenuDown,
            MenuLeft,
            MenuRight,
        ]
    }

    /// Look an action up by its stable id.
    pub fn from_id(id: &str) -> Option<Action> {
        Self::all().iter().copied().find(|a| a.id() == id)
    }
}

/// Screen regions an action may dirty; the shell repaints only these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub left_panel: bool,
    pub right_panel: bool,
    pub status: bool,
    pub chrome: bool,
}

impl Dirty {
    /// Nothing to repaint.
    pub const NONE: Dirty = Dirty {
        left_panel: false,
        right_panel: false,
        status: false,
        chrome: false,
    };

    /// Repaint everything.
    pub const ALL: Dirty = Dirty {
        left_panel: true,
        right_panel: true,
        status: true,
        chrome: true,
    };

    /// Only the status line.
    pub const STATUS: Dirty = Dirty {
        left_panel: false,
        right_panel: false,
        status: true,
        chrome: false,
    };

    /// Union of two dirty sets.
    pub fn merge(self, other: Dirty) -> Dirty {
        Dirty {
            left_panel: self.left_panel || other.left_panel,
            right_panel: self.right_panel || other.right_panel,
            status: self.status || other.status,
            chrome: self.chrome || other.chrome,
        }
    }

    /// Whether anything needs repainting.
    pub fn any(self) -> bool {
        self != Self::NONE
    }
}
