// Session picker form: year, race, session type, drivers

use std::collections::BTreeSet;

use egui::{ComboBox, RichText, ScrollArea};
use log::error;

use crate::f1data::{
    DriverEntry, F1Api, LoadedSession, RaceEvent, SessionSource, SessionType,
};

use super::HUD_TEXT_COLOR;

const DEFAULT_YEAR: &str = "2023";

pub(crate) struct LauncherScreen {
    year_text: String,
    races: Vec<RaceEvent>,
    selected_race: Option<usize>,
    session_type: SessionType,
    drivers: Vec<DriverEntry>,
    selected_codes: BTreeSet<String>,
    status: String,
}

impl Default for LauncherScreen {
    fn default() -> Self {
        Self {
            year_text: DEFAULT_YEAR.to_string(),
            races: Vec::new(),
            selected_race: None,
            session_type: SessionType::Race,
            drivers: Vec::new(),
            selected_codes: BTreeSet::new(),
            status: "Waiting for a session selection".to_string(),
        }
    }
}

impl LauncherScreen {
    pub(crate) fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Render the form for one frame. Returns a loaded session once the
    /// user hits start and the download succeeds.
    pub(crate) fn show<A: F1Api>(
        &mut self,
        ctx: &egui::Context,
        source: &SessionSource<A>,
    ) -> Option<LoadedSession> {
        let mut loaded = None;

        egui::TopBottomPanel::bottom("launcher_status").show(ctx, |ui| {
            ui.label(RichText::new(&self.status).color(HUD_TEXT_COLOR));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("F1 replay setup");
            ui.separator();

            ui.label(RichText::new("1. Season").strong());
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut self.year_text);
                if ui.button("Load calendar").clicked() {
                    self.load_calendar(source);
                }
            });
            ui.add_space(8.);

            ui.label(RichText::new("2. Race and session").strong());
            let selected_race_text = self
                .selected_race
                .and_then(|i| self.races.get(i))
                .map(|race| race.to_string())
                .unwrap_or_else(|| "-".to_string());
            ComboBox::from_label("Race")
                .selected_text(selected_race_text)
                .show_ui(ui, |ui| {
                    for (index, race) in self.races.iter().enumerate() {
                        ui.selectable_value(&mut self.selected_race, Some(index), race.to_string());
                    }
                });
            ComboBox::from_label("Session")
                .selected_text(self.session_type.to_string())
                .show_ui(ui, |ui| {
                    for session_type in SessionType::ALL {
                        ui.selectable_value(
                            &mut self.session_type,
                            session_type,
                            session_type.to_string(),
                        );
                    }
                });
            if ui.button("Load drivers").clicked() {
                self.load_drivers(source);
            }
            ui.add_space(8.);

            ui.label(RichText::new("3. Drivers").strong());
            ScrollArea::vertical().max_height(220.).show(ui, |ui| {
                for driver in &self.drivers {
                    let selected = self.selected_codes.contains(&driver.code);
                    let label = format!("{}  {}", driver.code, driver.team_name);
                    if ui.selectable_label(selected, label).clicked() {
                        if selected {
                            self.selected_codes.remove(&driver.code);
                        } else {
                            self.selected_codes.insert(driver.code.clone());
                        }
                    }
                }
            });
            ui.add_space(12.);

            if ui.button(RichText::new("Start replay").strong()).clicked() {
                loaded = self.start_replay(source);
            }
        });

        loaded
    }

    fn parse_year(&mut self) -> Option<i32> {
        match self.year_text.trim().parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => {
                self.status = format!("'{}' is not a year, try e.g. 2023", self.year_text);
                None
            }
        }
    }

    fn load_calendar<A: F1Api>(&mut self, source: &SessionSource<A>) {
        let Some(year) = self.parse_year() else {
            return;
        };
        self.status = format!("Fetching the {} calendar...", year);
        match source.schedule(year) {
            Ok(races) => {
                self.selected_race = if races.is_empty() { None } else { Some(0) };
                self.races = races;
                self.drivers.clear();
                self.selected_codes.clear();
                self.status = format!("Calendar loaded: {} rounds", self.races.len());
            }
            Err(e) => {
                error!("Calendar fetch failed: {}", e);
                self.status = format!("Could not load the calendar: {}", e);
            }
        }
    }

    fn load_drivers<A: F1Api>(&mut self, source: &SessionSource<A>) {
        let Some(year) = self.parse_year() else {
            return;
        };
        let Some(race) = self.selected_race.and_then(|i| self.races.get(i)) else {
            warn_dialog("Select a race first.");
            return;
        };
        self.status = "Fetching the driver list...".to_string();
        match source.driver_list(year, race, self.session_type) {
            Ok(drivers) => {
                self.selected_codes.clear();
                self.drivers = drivers;
                self.status = "Drivers loaded. Select some and start the replay.".to_string();
            }
            Err(e) => {
                error!("Driver list fetch failed: {}", e);
                self.status = format!("Could not load the drivers: {}", e);
            }
        }
    }

    fn start_replay<A: F1Api>(&mut self, source: &SessionSource<A>) -> Option<LoadedSession> {
        let Some(year) = self.parse_year() else {
            return None;
        };
        let Some(race) = self.selected_race.and_then(|i| self.races.get(i)) else {
            warn_dialog("Select a race first.");
            return None;
        };
        if self.selected_codes.is_empty() {
            warn_dialog("Select at least one driver!");
            return None;
        }

        self.status = "Downloading telemetry... the first load of a session can take a while"
            .to_string();
        let codes: Vec<String> = self.selected_codes.iter().cloned().collect();
        match source.load_session(year, race, self.session_type, &codes) {
            Ok(loaded) => {
                if loaded.cars.len() < codes.len() {
                    self.status = format!(
                        "Loaded {} of {} drivers, the rest had no usable telemetry",
                        loaded.cars.len(),
                        codes.len()
                    );
                }
                Some(loaded)
            }
            Err(e) => {
                error!("Session load failed: {}", e);
                self.status = format!("Could not load the session: {}", e);
                None
            }
        }
    }
}

fn warn_dialog(text: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Apexview")
        .set_description(text)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
