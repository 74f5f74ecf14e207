mod editor;
mod kill_ring;
mod line_buffer;
mod undo;

pub use editor::Editor;
pub use kill_ring::{KillDirection, KillRing};
pub use line_buffer::{LineBuffer, RegionType};
pub use undo::{EditOp, UndoLog};
