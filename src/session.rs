use thiserror::Error;
use tracing::debug;

use crate::{
    color::{Color, ParseColorError},
    history::{EditHistory, EditOperation, HistoryConfig, HistoryError},
    raster::Raster,
    replace::{self, ColorReplacement, ReplaceError, Tolerance},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImage,
    #[error("no color picked")]
    NoColorSelected,
    #[error("pixel ({x}, {y}) is outside the image")]
    PixelOutOfBounds { x: u32, y: u32 },
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error(transparent)]
    Replace(#[from] ReplaceError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub replacement: Color,
    pub tolerance: Tolerance,
    pub history: HistoryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            replacement: Color::new(0xff, 0, 0),
            tolerance: Tolerance(30),
            history: HistoryConfig::default(),
        }
    }
}

/// Everything one editing session holds: the loaded image with its edit
/// history, the picked colour and the replacement settings.
///
/// Renderers only need [`EditSession::current`]. Mutating calls must be
/// serialized by the owner.
#[derive(Debug, Clone)]
pub struct EditSession {
    config: SessionConfig,
    history: Option<EditHistory>,
    selected: Option<Color>,
    replacement: Color,
    tolerance: Tolerance,
}

impl EditSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            history: None,
            selected: None,
            replacement: config.replacement,
            tolerance: config.tolerance,
        }
    }

    /// Start over with a freshly decoded image. Drops all edits and the picked colour.
    pub fn load(&mut self, image: Raster) {
        debug!(width = image.width(), height = image.height(), "loading image");
        match &mut self.history {
            Some(history) => history.reset(image),
            None => self.history = Some(EditHistory::with_config(image, self.config.history)),
        }
        self.selected = None;
    }

    pub fn history(&self) -> Option<&EditHistory> {
        self.history.as_ref()
    }

    pub fn current(&self) -> Option<&Raster> {
        self.history.as_ref().map(EditHistory::current)
    }

    pub fn selected_color(&self) -> Option<Color> {
        self.selected
    }

    pub fn replacement(&self) -> Color {
        self.replacement
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Eyedropper on the currently displayed raster.
    pub fn pick_color(&mut self, x: u32, y: u32) -> Result<Color, SessionError> {
        let color = self
            .current()
            .ok_or(SessionError::NoImage)?
            .color_at(x, y)
            .ok_or(SessionError::PixelOutOfBounds { x, y })?;
        debug!(x, y, %color, "picked color");
        self.selected = Some(color);
        Ok(color)
    }

    pub fn select_color(&mut self, hex: &str) -> Result<Color, SessionError> {
        let color = hex.parse()?;
        self.selected = Some(color);
        Ok(color)
    }

    pub fn set_replacement(&mut self, hex: &str) -> Result<Color, SessionError> {
        let color = hex.parse()?;
        self.replacement = color;
        Ok(color)
    }

    pub fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    /// Recolour the displayed raster with the current settings and record
    /// the result as the newest edit.
    pub fn apply(&mut self) -> Result<&EditOperation, SessionError> {
        let target = self.selected.ok_or(SessionError::NoColorSelected)?;
        let history = self.history.as_mut().ok_or(SessionError::NoImage)?;
        let params = ColorReplacement::new(target, self.replacement, self.tolerance);

        let op = replace::apply_replacement(history.current(), &params)?;
        history.record(op);
        let (index, len) = (history.cursor(), history.len());
        history
            .current_edit()
            .ok_or(SessionError::History(HistoryError::OutOfRange { index, len }))
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(EditHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(EditHistory::can_redo)
    }

    pub fn undo(&mut self) -> Result<&Raster, SessionError> {
        Ok(self.history_mut()?.undo())
    }

    pub fn redo(&mut self) -> Result<&Raster, SessionError> {
        Ok(self.history_mut()?.redo()?)
    }

    pub fn jump_to(&mut self, index: isize) -> Result<&Raster, SessionError> {
        Ok(self.history_mut()?.jump_to(index)?)
    }

    fn history_mut(&mut self) -> Result<&mut EditHistory, SessionError> {
        self.history.as_mut().ok_or(SessionError::NoImage)
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
