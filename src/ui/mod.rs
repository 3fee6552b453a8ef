use egui::{Color32, Visuals, style::Widgets};
use log::error;

use crate::errors::ApexviewError;
use crate::f1data::{LoadedSession, OpenF1Client, SessionSource};

pub(crate) mod launcher;
pub(crate) mod viewer;

use launcher::LauncherScreen;
use viewer::ReplayScreen;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const TRACK_COLOR: Color32 = Color32::WHITE;
pub(crate) const HUD_TEXT_COLOR: Color32 = Color32::from_rgb(200, 200, 200);

// Marker colors for cars whose team the API reports no color for. Red
// first: the single-car replay keeps the classic red dot.
const FALLBACK_CAR_COLORS: [[u8; 3]; 8] = [
    [230, 30, 30],
    [30, 110, 230],
    [30, 200, 120],
    [240, 190, 40],
    [190, 80, 230],
    [240, 130, 40],
    [90, 220, 230],
    [230, 90, 160],
];

/// Marker color for one car: the team color when the roster has one,
/// otherwise a stable pick from the fallback palette.
pub(crate) fn car_rgb(team_color: Option<&str>, car_index: usize) -> [u8; 3] {
    team_color
        .and_then(parse_hex_rgb)
        .unwrap_or(FALLBACK_CAR_COLORS[car_index % FALLBACK_CAR_COLORS.len()])
}

/// Parse a "RRGGBB" hex string, with or without a leading '#'.
fn parse_hex_rgb(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// The desktop app: the session picker form and the replay screen it
/// hands off to, one visible at a time.
pub struct ApexviewApp {
    source: SessionSource<OpenF1Client>,
    screen: Screen,
}

enum Screen {
    Launcher(LauncherScreen),
    Replay(ReplayScreen),
}

impl ApexviewApp {
    /// Start on the session picker.
    pub fn launcher(
        source: SessionSource<OpenF1Client>,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        Self::apply_visuals(cc);
        Self {
            source,
            screen: Screen::Launcher(LauncherScreen::default()),
        }
    }

    /// Start directly on the replay screen with a pre-loaded session.
    pub fn replay(
        source: SessionSource<OpenF1Client>,
        loaded: LoadedSession,
        cc: &eframe::CreationContext<'_>,
    ) -> Result<Self, ApexviewError> {
        Self::apply_visuals(cc);
        Ok(Self {
            source,
            screen: Screen::Replay(ReplayScreen::new(loaded)?),
        })
    }

    fn apply_visuals(cc: &eframe::CreationContext<'_>) {
        cc.egui_ctx.set_visuals(Visuals {
            dark_mode: true,
            panel_fill: PALETTE_BLACK,
            faint_bg_color: PALETTE_BLACK,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        });
    }
}

impl eframe::App for ApexviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match &mut self.screen {
            Screen::Launcher(launcher) => {
                if let Some(loaded) = launcher.show(ctx, &self.source) {
                    match ReplayScreen::new(loaded) {
                        Ok(replay) => self.screen = Screen::Replay(replay),
                        Err(e) => {
                            error!("Could not start the replay: {}", e);
                            launcher.set_status(format!("Could not start the replay: {}", e));
                        }
                    }
                }
            }
            Screen::Replay(replay) => {
                if replay.show(ctx) {
                    self.screen = Screen::Launcher(LauncherScreen::default());
                }
            }
        }
    }
}
