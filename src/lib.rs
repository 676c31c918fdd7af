//! Pick a colour in an RGBA raster, swap every pixel within a tolerance of
//! it for another colour while keeping the original shading, and step back
//! and forth through the resulting edits.
//!
//! ```
//! use recolor::{history::EditHistory, raster::Raster, replace};
//!
//! let image = Raster::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
//! let mut history = EditHistory::new(image);
//!
//! let edit = replace::apply(history.current(), "#ff0000", "#0000ff", 10).unwrap();
//! history.record(edit);
//! assert_eq!(history.current().pixel(0, 0), Some([0, 0, 255, 255]));
//!
//! history.undo();
//! assert_eq!(history.current().pixel(0, 0), Some([255, 0, 0, 255]));
//! ```

pub mod color;
pub mod history;
pub mod hsl;
pub mod raster;
pub mod replace;
pub mod session;

pub use color::{Color, ParseColorError};
pub use history::{EditHistory, EditId, EditOperation, HistoryConfig, HistoryError, ORIGINAL};
pub use hsl::{hsl_to_rgb, rgb_to_hsl, Hsl};
pub use raster::{Raster, RasterError};
pub use replace::{apply, replace_colors, ColorReplacement, ReplaceError, Tolerance};
pub use session::{EditSession, SessionConfig, SessionError};
