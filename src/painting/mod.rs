mod painter;
mod status_bar;
mod styled_text;
mod wrap;

pub use painter::Painter;
pub use status_bar::{StatusBar, StatusState};
pub use styled_text::{cells_of_ansi_str, Cell, StyledText};
pub use wrap::WrapModel;
