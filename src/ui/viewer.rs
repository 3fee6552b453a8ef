// Animated replay: track outline, car markers, HUD, keyboard controls

use egui::{Align2, Color32, FontId, Key, Pos2, Rect, RichText, Shape, Stroke, Vec2};

use crate::errors::ApexviewError;
use crate::f1data::{LoadedSession, TelemetrySeries};
use crate::replay::{Car, PlaybackClock, TrackTransform};

use super::{HUD_TEXT_COLOR, TRACK_COLOR, car_rgb};

/// Total breathing room around the track, in pixels per axis.
const TRACK_MARGIN: f64 = 100.;
const TRACK_STROKE_WIDTH: f32 = 3.;
const CAR_RADIUS: f32 = 5.;
const LABEL_OFFSET: Vec2 = Vec2::new(8., -8.);

// Nominal area used to validate the geometry before the first frame.
const NOMINAL_DRAW_WIDTH: f64 = 800.;
const NOMINAL_DRAW_HEIGHT: f64 = 600.;

pub(crate) struct ReplayScreen {
    reference: TelemetrySeries,
    cars: Vec<Car>,
    clock: PlaybackClock,
}

impl ReplayScreen {
    /// Build the replay state, rejecting sessions whose reference lap has
    /// a degenerate bounding box before any frame is drawn.
    pub(crate) fn new(loaded: LoadedSession) -> Result<Self, ApexviewError> {
        TrackTransform::fit(
            &loaded.reference,
            NOMINAL_DRAW_WIDTH,
            NOMINAL_DRAW_HEIGHT,
            TRACK_MARGIN,
        )?;

        let cars = loaded
            .cars
            .into_iter()
            .enumerate()
            .map(|(index, car)| {
                Car::new(
                    car.entry.code,
                    car.entry.team_name,
                    car_rgb(car.entry.team_color.as_deref(), index),
                    car.series,
                )
            })
            .collect();

        Ok(Self {
            reference: loaded.reference,
            cars,
            clock: PlaybackClock::default(),
        })
    }

    /// Render one frame. Returns true when the user asked to go back to
    /// the session picker.
    pub(crate) fn show(&mut self, ctx: &egui::Context) -> bool {
        let (pause, faster, slower, back, frame_delta) = ctx.input(|i| {
            (
                i.key_pressed(Key::Space),
                i.key_pressed(Key::ArrowUp),
                i.key_pressed(Key::ArrowDown),
                i.key_pressed(Key::Escape),
                i.stable_dt,
            )
        });
        apply_clock_controls(&mut self.clock, pause, faster, slower);
        self.clock.tick(frame_delta as f64);
        let elapsed = self.clock.elapsed();

        egui::TopBottomPanel::top("replay_hud").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format_clock(elapsed))
                        .color(Color32::WHITE)
                        .strong(),
                );
                ui.separator();
                ui.label(
                    RichText::new(format!("x{:.1}", self.clock.speed_multiplier()))
                        .color(HUD_TEXT_COLOR),
                );
                if self.clock.is_paused() {
                    ui.separator();
                    ui.label(RichText::new("PAUSED").color(Color32::YELLOW));
                }
                ui.separator();
                ui.label(
                    RichText::new("space pause | up/down speed | esc back").color(HUD_TEXT_COLOR),
                );
            });
        });

        egui::TopBottomPanel::bottom("replay_cars").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for car in &self.cars {
                    let sample = car.sample_at(elapsed);
                    let color = Color32::from_rgb(car.rgb[0], car.rgb[1], car.rgb[2]);
                    ui.label(
                        RichText::new(format!(
                            "{} {:>3.0} km/h G{}",
                            car.code, sample.speed_kmh, sample.gear
                        ))
                        .color(color),
                    );
                    ui.separator();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::hover());
            let rect = response.rect;

            match TrackTransform::fit(
                &self.reference,
                rect.width() as f64,
                rect.height() as f64,
                TRACK_MARGIN,
            ) {
                Ok(transform) => {
                    let outline: Vec<Pos2> = transform
                        .polyline(&self.reference)
                        .into_iter()
                        .map(|(x, y)| to_screen(rect, x, y))
                        .collect();
                    painter.add(Shape::line(
                        outline,
                        Stroke::new(TRACK_STROKE_WIDTH, TRACK_COLOR),
                    ));

                    for car in &mut self.cars {
                        car.advance(elapsed, &transform);
                        let center =
                            to_screen(rect, car.screen_position.0, car.screen_position.1);
                        let color = Color32::from_rgb(car.rgb[0], car.rgb[1], car.rgb[2]);
                        painter.circle_filled(center, CAR_RADIUS, color);
                        painter.text(
                            center + LABEL_OFFSET,
                            Align2::LEFT_BOTTOM,
                            &car.code,
                            FontId::proportional(12.),
                            color,
                        );
                    }
                }
                Err(e) => {
                    painter.text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        e.to_string(),
                        FontId::proportional(14.),
                        Color32::RED,
                    );
                }
            }
        });

        // keep the animation running even without input events
        ctx.request_repaint();
        back
    }
}

/// Telemetry world coordinates grow upwards, egui's y axis grows down.
fn to_screen(rect: Rect, x: f64, y: f64) -> Pos2 {
    Pos2::new(rect.left() + x as f32, rect.bottom() - y as f32)
}

pub(crate) fn apply_clock_controls(
    clock: &mut PlaybackClock,
    pause_pressed: bool,
    faster_pressed: bool,
    slower_pressed: bool,
) {
    if pause_pressed {
        clock.toggle_pause();
    }
    if faster_pressed {
        clock.faster();
    }
    if slower_pressed {
        clock.slower();
    }
}

fn format_clock(elapsed: f64) -> String {
    let minutes = (elapsed / 60.) as u64;
    let seconds = elapsed - minutes as f64 * 60.;
    format!("{}:{:04.1}", minutes, seconds)
}
