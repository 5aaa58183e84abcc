//! Inline edit state and the color-picker modal.
//!
//! A [`FieldEditor`] walks one field through Idle → Editing → Committing and
//! back, or to Cancelled. The controller applies the committed value and hands
//! the result back so a rejected value re-opens the editor with its message.

use crate::color::{self, PaletteColor, PALETTE};
use crate::errors::AppError;
use crate::models::{Squad, Stat};

/// Which roster field an editor is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    SquadName { squad: usize },
    Colonel { squad: usize },
    MemberName { squad: usize, member: usize },
    MemberRank { squad: usize, member: usize },
    MemberStat { squad: usize, member: usize, stat: Stat },
    GeneralName,
    GeneralStat(Stat),
    /// Empty input clears the override.
    MissionsOverride,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing {
        field: EditField,
        original: String,
        input: String,
        error: Option<String>,
    },
    Committing {
        field: EditField,
        original: String,
        value: String,
    },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct FieldEditor {
    state: EditState,
}

impl Default for FieldEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldEditor {
    pub fn new() -> Self {
        Self {
            state: EditState::Idle,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    /// The message from the last rejected commit, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Start editing `field`, pre-filled with its current value. Any edit in
    /// progress is abandoned.
    pub fn begin(&mut self, field: EditField, current: impl Into<String>) {
        let original = current.into();
        self.state = EditState::Editing {
            field,
            input: original.clone(),
            original,
            error: None,
        };
    }

    /// Replace the pending input. Ignored unless editing.
    pub fn input(&mut self, text: impl Into<String>) {
        if let EditState::Editing { input, .. } = &mut self.state {
            *input = text.into();
        }
    }

    /// Move to Committing and hand out the value to apply.
    pub fn commit(&mut self) -> Option<(EditField, String)> {
        let EditState::Editing {
            field,
            original,
            input,
            ..
        } = std::mem::replace(&mut self.state, EditState::Idle)
        else {
            return None;
        };

        self.state = EditState::Committing {
            field,
            original,
            value: input.clone(),
        };
        Some((field, input))
    }

    /// Finish a commit. A rejection returns to Editing with the message and
    /// the rejected input kept for correction.
    pub fn resolve(&mut self, result: Result<(), &AppError>) {
        let EditState::Committing {
            field,
            original,
            value,
        } = std::mem::replace(&mut self.state, EditState::Idle)
        else {
            return;
        };

        if let Err(err) = result {
            self.state = EditState::Editing {
                field,
                original,
                input: value,
                error: Some(err.message().to_string()),
            };
        }
    }

    /// Drop the pending input; the roster is untouched.
    pub fn cancel(&mut self) {
        if self.is_editing() {
            self.state = EditState::Cancelled;
        }
    }
}

/// What the color picker decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorChoice {
    /// Palette entry with its paired text color
    Palette(&'static PaletteColor),
    /// `#RRGGBB`; the text color is derived by contrast
    Custom(String),
}

/// One row of the picker grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorOption {
    pub index: usize,
    pub name: &'static str,
    pub value: &'static str,
    pub text_color: &'static str,
    pub current: bool,
}

/// Live preview of the custom hex input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorPreview {
    Empty,
    Valid { color: String, text_color: String },
    Invalid,
}

impl ColorPreview {
    pub fn label(&self) -> &str {
        match self {
            ColorPreview::Empty => "Preview",
            ColorPreview::Valid { color, .. } => color,
            ColorPreview::Invalid => "Invalid format",
        }
    }
}

/// Modal color picker for one squad. Owns its own state; closing consumes it.
#[derive(Debug, Clone)]
pub struct ColorPicker {
    squad: usize,
    title: String,
    current: String,
    custom_open: bool,
    custom_input: String,
}

impl ColorPicker {
    pub fn open(squad_index: usize, squad: &Squad) -> Self {
        Self {
            squad: squad_index,
            title: format!("Select color for {}", squad.name),
            current: squad.color.clone(),
            custom_open: false,
            custom_input: String::new(),
        }
    }

    pub fn squad(&self) -> usize {
        self.squad
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn options(&self) -> Vec<ColorOption> {
        PALETTE
            .iter()
            .enumerate()
            .map(|(index, entry)| ColorOption {
                index,
                name: entry.name,
                value: entry.value,
                text_color: entry.text_color,
                current: entry.value.eq_ignore_ascii_case(&self.current),
            })
            .collect()
    }

    pub fn choose(&self, index: usize) -> Result<ColorChoice, AppError> {
        PALETTE
            .get(index)
            .map(ColorChoice::Palette)
            .ok_or_else(|| AppError::NotFound(format!("Color option {} not found", index)))
    }

    pub fn is_custom_open(&self) -> bool {
        self.custom_open
    }

    pub fn open_custom(&mut self) {
        self.custom_open = true;
    }

    pub fn set_custom_input(&mut self, text: impl Into<String>) {
        self.custom_input = text.into();
    }

    pub fn clear_custom(&mut self) {
        self.custom_input.clear();
    }

    pub fn preview(&self) -> ColorPreview {
        let input = self.custom_input.trim();
        if input.is_empty() {
            ColorPreview::Empty
        } else if color::is_custom_hex(input) {
            ColorPreview::Valid {
                color: input.to_string(),
                text_color: color::contrast_of(input),
            }
        } else {
            ColorPreview::Invalid
        }
    }

    /// Validate the custom input. An invalid code keeps the picker open.
    pub fn apply_custom(&self) -> Result<ColorChoice, AppError> {
        let input = self.custom_input.trim();
        if color::is_custom_hex(input) {
            Ok(ColorChoice::Custom(input.to_string()))
        } else {
            Err(AppError::Validation(
                "Please enter a valid HEX code (example: #FF5733)".to_string(),
            ))
        }
    }

    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterState;

    #[test]
    fn test_begin_commit_resolve_ok() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::SquadName { squad: 0 }, "Alpha");
        editor.input("Bravo");

        let (field, value) = editor.commit().unwrap();
        assert_eq!(field, EditField::SquadName { squad: 0 });
        assert_eq!(value, "Bravo");
        assert!(matches!(editor.state(), EditState::Committing { .. }));

        editor.resolve(Ok(()));
        assert_eq!(editor.state(), &EditState::Idle);
    }

    #[test]
    fn test_rejected_commit_reopens_with_message() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::GeneralName, "General");
        editor.input("X");
        editor.commit().unwrap();

        let err = AppError::Validation("too short".to_string());
        editor.resolve(Err(&err));

        assert!(editor.is_editing());
        assert_eq!(editor.error(), Some("too short"));
        match editor.state() {
            EditState::Editing {
                original, input, ..
            } => {
                assert_eq!(original, "General");
                assert_eq!(input, "X");
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_cancel_and_idle_transitions() {
        let mut editor = FieldEditor::new();
        assert!(editor.commit().is_none());
        editor.cancel();
        assert_eq!(editor.state(), &EditState::Idle);

        editor.begin(EditField::MissionsOverride, "55");
        editor.cancel();
        assert_eq!(editor.state(), &EditState::Cancelled);
        assert!(editor.commit().is_none());
    }

    #[test]
    fn test_picker_marks_current_color() {
        let state = RosterState::seeded();
        let picker = ColorPicker::open(0, &state.squads[0]);

        let options = picker.options();
        assert_eq!(options.len(), PALETTE.len());
        let current: Vec<_> = options.iter().filter(|o| o.current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "Blue");
        assert_eq!(picker.title(), "Select color for Alpha Squad");
    }

    #[test]
    fn test_picker_choices() {
        let state = RosterState::seeded();
        let picker = ColorPicker::open(0, &state.squads[0]);

        assert_eq!(
            picker.choose(1).unwrap(),
            ColorChoice::Palette(&PALETTE[1])
        );
        assert!(matches!(picker.choose(99), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_custom_preview_and_apply() {
        let state = RosterState::seeded();
        let mut picker = ColorPicker::open(0, &state.squads[0]);
        picker.open_custom();
        assert!(picker.is_custom_open());
        assert_eq!(picker.preview(), ColorPreview::Empty);

        picker.set_custom_input("#FF57");
        assert_eq!(picker.preview(), ColorPreview::Invalid);
        assert_eq!(picker.preview().label(), "Invalid format");
        assert!(matches!(picker.apply_custom(), Err(AppError::Validation(_))));

        picker.set_custom_input("#000000");
        assert_eq!(
            picker.preview(),
            ColorPreview::Valid {
                color: "#000000".to_string(),
                text_color: "#ffffff".to_string(),
            }
        );
        assert_eq!(
            picker.apply_custom().unwrap(),
            ColorChoice::Custom("#000000".to_string())
        );

        picker.clear_custom();
        assert_eq!(picker.preview(), ColorPreview::Empty);
        picker.close();
    }
}
