/// Rating button styling
///
/// Buttons are colored by condition band so good and poor ratings are
/// easy to tell apart at a glance.
use iced::widget::button;
use iced::{Background, Border, Color, Theme};

use crate::state::data::Rating;

/// Size of a rating button (square, fully rounded)
pub const RATING_BUTTON_SIZE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    Good,
    Fair,
    Marginal,
    Poor,
}

impl RatingBand {
    pub fn of(rating: Rating) -> Self {
        match rating.value() {
            9..=10 => RatingBand::Good,
            7..=8 => RatingBand::Fair,
            5..=6 => RatingBand::Marginal,
            _ => RatingBand::Poor,
        }
    }

    pub fn color(self) -> Color {
        match self {
            RatingBand::Good => Color::from_rgb8(0x00, 0x80, 0x00),
            RatingBand::Fair => Color::from_rgb8(0x00, 0x00, 0xFF),
            RatingBand::Marginal => Color::from_rgb8(0xFF, 0xA5, 0x00),
            RatingBand::Poor => Color::from_rgb8(0xFF, 0x00, 0x00),
        }
    }
}

/// Button style for a rating, dimmed while hovered or pressed
pub fn rating_button(rating: Rating) -> impl Fn(&Theme, button::Status) -> button::Style {
    let base = RatingBand::of(rating).color();

    move |_theme, status| {
        let color = match status {
            button::Status::Hovered => Color { a: 0.85, ..base },
            button::Status::Pressed => Color { a: 0.7, ..base },
            button::Status::Active | button::Status::Disabled => base,
        };

        button::Style {
            background: Some(Background::Color(color)),
            text_color: Color::WHITE,
            border: Border {
                radius: (RATING_BUTTON_SIZE / 2.0).into(),
                ..Border::default()
            },
            ..button::Style::default()
        }
    }
}
