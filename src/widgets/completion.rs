use crate::engine::{CompleteKind, EditSession};

pub(crate) fn complete_word(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::Word)
}

pub(crate) fn expand_or_complete(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::ExpandOrWord)
}

pub(crate) fn menu_complete(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::Menu)
}

pub(crate) fn menu_expand_or_complete(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::Menu)
}

pub(crate) fn reverse_menu_complete(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::MenuReverse)
}

pub(crate) fn menu_select(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::Menu)
}

pub(crate) fn list_choices(s: &mut EditSession) -> bool {
    s.take_count();
    s.start_completion(CompleteKind::List)
}
