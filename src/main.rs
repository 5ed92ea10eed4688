use std::path::PathBuf;

use iced::keyboard::{self, key, Key, Modifiers};
use iced::widget::{button, column, container, image, row, text, Column};
use iced::{alignment, window, Alignment, ContentFit, Element, Length, Size, Subscription, Task, Theme};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tracing_subscriber::EnvFilter;

mod images;
mod state;
mod ui;

use images::queue::{self, AssembledQueue, LoadError};
use state::data::{Navigation, Rating};
use state::session::RatingSession;
use state::settings::Settings;
use ui::display::{self, DisplayEntry};
use ui::style;

/// Size of the preview pane
const PREVIEW_WIDTH: f32 = 720.0;
const PREVIEW_HEIGHT: f32 = 560.0;

/// Main application state
struct Reviewer {
    /// The current review pass (empty until a load succeeds)
    session: RatingSession,
    /// Root of the last successful load; CSV names are resolved under it
    image_folder: Option<PathBuf>,
    /// Persisted preferences
    settings: Settings,
    /// Where settings are written (None keeps them in memory only)
    settings_path: Option<PathBuf>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Load Images"
    LoadImages,
    /// User clicked "Load CSV"
    LoadCsv,
    /// Background load finished
    Loaded(Result<AssembledQueue, LoadError>),
    Next,
    Previous,
    /// Rating button or number key
    Rate(u8),
    Undo,
    /// Main window was resized
    WindowResized(Size),
    /// User asked to close a window
    CloseRequested(window::Id),
}

impl Reviewer {
    /// Create a new instance of the application
    fn new(settings: Settings, settings_path: Option<PathBuf>) -> (Self, Task<Message>) {
        tracing::info!("reviewer started");

        (
            Reviewer {
                session: RatingSession::empty(),
                image_folder: None,
                settings,
                settings_path,
                status: "Load an image folder to begin.".to_string(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::LoadImages => {
                // Show the native folder picker, starting at the last folder used
                let mut dialog = FileDialog::new().set_title("Select Image Folder");
                if let Some(dir) = &self.settings.last_image_folder {
                    dialog = dialog.set_directory(dir);
                }

                // Cancelled picker is a no-op
                let Some(folder) = dialog.pick_folder() else {
                    return Task::none();
                };

                // The folder only becomes the CSV root once the scan succeeds
                self.status = format!("Scanning {}...", folder.display());
                Task::perform(queue::load_directory(folder), Message::Loaded)
            }
            Message::LoadCsv => {
                // CSV rows are resolved against the folder of the loaded session
                let Some(root) = self.image_folder.clone() else {
                    self.warn("Warning", &LoadError::NoImageFolder.to_string());
                    return Task::none();
                };

                let mut dialog = FileDialog::new()
                    .set_title("Select CSV File")
                    .add_filter("CSV Files", &["csv"]);
                if let Some(dir) = &self.settings.last_csv_folder {
                    dialog = dialog.set_directory(dir);
                }

                let Some(csv_path) = dialog.pick_file() else {
                    return Task::none();
                };

                // Remember where the CSV came from for the next picker
                self.settings.last_csv_folder = csv_path.parent().map(|p| p.to_path_buf());
                self.save_settings();

                self.status = format!("Loading {}...", csv_path.display());
                Task::perform(queue::load_csv(root, csv_path), Message::Loaded)
            }
            Message::Loaded(result) => {
                match self.apply_load(result) {
                    Ok(()) => self.save_settings(),
                    Err(e) => self.warn("Warning", &e.to_string()),
                }
                Task::none()
            }
            Message::Next => {
                // Past the last image this reports completion instead of moving
                match self.session.next() {
                    Ok(navigation) => self.show_navigation(navigation),
                    Err(e) => self.warn("Warning", &e.to_string()),
                }
                Task::none()
            }
            Message::Previous => {
                match self.session.previous() {
                    Ok(Navigation::AtStart) => self.status = "Already at the first image.".into(),
                    Ok(navigation) => self.show_navigation(navigation),
                    Err(e) => self.warn("Warning", &e.to_string()),
                }
                Task::none()
            }
            Message::Rate(value) => {
                match self.session.rate(i64::from(value)) {
                    Ok(outcome) => {
                        self.show_navigation(outcome.navigation);

                        // Moves and failed moves go to the status line, never a dialog
                        if let Some(note) = display::rate_message(&outcome) {
                            self.status = match outcome.navigation {
                                Navigation::Completed => format!("{} {}", note, self.status),
                                _ => note,
                            };
                        }
                    }
                    Err(e) => self.warn("Warning", &e.to_string()),
                }
                Task::none()
            }
            Message::Undo => {
                match self.session.undo() {
                    Ok(Some(outcome)) => self.status = display::undo_message(&outcome),
                    Ok(None) => self.status = "Nothing to undo.".into(),
                    Err(e) => self.warn("Warning", &e.to_string()),
                }
                Task::none()
            }
            Message::WindowResized(size) => {
                // Kept in memory; written once when the window closes
                self.settings.window_width = size.width;
                self.settings.window_height = size.height;
                Task::none()
            }
            Message::CloseRequested(id) => {
                self.save_settings();
                window::close(id)
            }
        }
    }

    /// Apply a finished load without any UI side effects
    ///
    /// On failure the session, the image folder and the settings are left
    /// exactly as they were.
    fn apply_load(&mut self, result: Result<AssembledQueue, LoadError>) -> Result<(), LoadError> {
        let assembled = match result {
            Ok(assembled) => assembled,
            Err(e) => {
                tracing::warn!(error = %e, "load abandoned");
                self.status = e.to_string();
                return Err(e);
            }
        };

        self.status = display::loaded_message(&assembled);
        self.image_folder = Some(assembled.root.clone());
        self.settings.last_image_folder = Some(assembled.root.clone());

        // A successful load replaces the whole session
        self.session = RatingSession::from(assembled);
        Ok(())
    }

    /// Best-effort write of the settings file
    fn save_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save_to(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not save settings");
        }
    }

    fn show_navigation(&mut self, navigation: Navigation) {
        self.status = match navigation {
            Navigation::Completed => display::completion_message(&self.session.summary()),
            Navigation::Advanced | Navigation::AtStart => String::new(),
        };
    }

    /// Blocking warning dialog, mirrored into the status line
    fn warn(&mut self, title: &str, description: &str) {
        self.status = description.to_string();
        MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(description)
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let rating_buttons = Rating::all().fold(Column::new().spacing(6), |buttons, rating| {
            buttons.push(
                button(
                    text(rating.to_string())
                        .size(14)
                        .width(Length::Fill)
                        .align_x(alignment::Horizontal::Center),
                )
                .width(style::RATING_BUTTON_SIZE)
                .height(style::RATING_BUTTON_SIZE)
                .style(style::rating_button(rating))
                .on_press(Message::Rate(rating.value())),
            )
        });

        let loaded = !self.session.is_empty();
        let top_bar = row![
            button("Load Images").on_press(Message::LoadImages).padding(10),
            button("Load CSV").on_press(Message::LoadCsv).padding(10),
            button("Previous").on_press_maybe(loaded.then_some(Message::Previous)).padding(10),
            button("Next").on_press_maybe(loaded.then_some(Message::Next)).padding(10),
            button("Undo")
                .on_press_maybe(self.session.can_undo().then_some(Message::Undo))
                .padding(10),
        ]
        .spacing(10);

        let current = self.session.current().ok().map(DisplayEntry::from);

        let preview: Element<Message> = match &current {
            Some(entry) => image(image::Handle::from_path(&entry.path))
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Contain)
                .into(),
            None => text("No Image Loaded").into(),
        };
        let preview = container(preview)
            .center_x(Length::Fixed(PREVIEW_WIDTH))
            .center_y(Length::Fixed(PREVIEW_HEIGHT));

        let label = current
            .as_ref()
            .map(DisplayEntry::label)
            .unwrap_or_else(|| "Rating: 0, Confidence: 0%".to_string());

        let position = match (self.session.position(), &current) {
            (Some((index, total)), Some(entry)) => format!(
                "{} / {}  {}",
                index,
                total,
                entry.path.file_name().unwrap_or_default().to_string_lossy()
            ),
            _ => String::new(),
        };

        let viewer = column![
            top_bar,
            preview,
            text(label).size(30),
            text(position).size(14),
            text(&self.status).size(16),
        ]
        .spacing(10)
        .align_x(Alignment::Center);

        container(row![rating_buttons, viewer].spacing(20).padding(20))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Keyboard shortcuts: 1-9 and 0 (=10) rate, arrows/space navigate, u undoes.
    /// Window size changes are tracked so the next launch reopens at that size.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(key_binding),
            window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
            window::close_requests().map(Message::CloseRequested),
        ])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn key_binding(key: Key, modifiers: Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(key::Named::ArrowRight) | Key::Named(key::Named::Space) => Some(Message::Next),
        Key::Named(key::Named::ArrowLeft) => Some(Message::Previous),
        Key::Character("z") if modifiers.command() => Some(Message::Undo),
        Key::Character("u") => Some(Message::Undo),
        Key::Character("0") => Some(Message::Rate(Rating::MAX)),
        Key::Character(c) => c
            .parse::<u8>()
            .ok()
            .filter(|v| (Rating::MIN..=9).contains(v))
            .map(Message::Rate),
        _ => None,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pavement_qc=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_logging();

    let settings_path = Settings::default_path();
    let settings = settings_path
        .as_deref()
        .map(Settings::load_from)
        .unwrap_or_default();
    let window_size = Size::new(settings.window_width, settings.window_height);

    iced::application(
        "Quality Control Viewer for iPSCI Rating",
        Reviewer::update,
        Reviewer::view,
    )
    .theme(Reviewer::theme)
    .subscription(Reviewer::subscription)
    .window_size(window_size)
    .exit_on_close_request(false)
    .centered()
    .run_with(move || Reviewer::new(settings, settings_path))
}
