pub mod hud;
pub mod panel;

pub use hud::hud_overlay;
pub use panel::{record_selection, ui_panel};

pub const PANEL_W: f32 = 260.0;
pub const HUD_PANEL_GAP: f32 = 12.0;
pub const HUD_EDGE_PADDING: f32 = 8.0;
