pub mod detect_panel;
pub mod feedback_panel;
pub mod history_panel;
pub mod navbar;
pub mod undo_snackbar;
