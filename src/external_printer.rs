use crossbeam::channel::{bounded, Receiver, SendError, Sender};

/// Default capacity of the print-above queue.
pub const DEFAULT_PRINTER_CAPACITY: usize = 20;

/// Cross-thread handle for printing text above an active prompt.
///
/// Messages land in a bounded channel that the edit session drains between
/// widget steps: the prompt block scrolls down, the foreign text is written
/// above it, and the prompt repaints. This is the only cross-thread surface
/// of a session.
#[derive(Debug, Clone)]
pub struct ExternalPrinter {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl Default for ExternalPrinter {
    fn default() -> Self {
        Self::new(DEFAULT_PRINTER_CAPACITY)
    }
}

impl ExternalPrinter {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded::<String>(capacity.max(1));
        Self { sender, receiver }
    }

    /// A clonable sender for other threads.
    pub fn sender(&self) -> Sender<String> {
        self.sender.clone()
    }

    /// Queue a line, blocking while the queue is full.
    pub fn print(&self, line: impl Into<String>) -> Result<(), SendError<String>> {
        self.sender.send(line.into())
    }

    /// Take one queued line without blocking.
    pub(crate) fn try_recv(&self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn queued_lines_drain_in_order() {
        let printer = ExternalPrinter::new(4);
        printer.print("one").unwrap();
        printer.print("two").unwrap();
        assert_eq!(printer.try_recv().as_deref(), Some("one"));
        assert_eq!(printer.try_recv().as_deref(), Some("two"));
        assert_eq!(printer.try_recv(), None);
    }

    #[test]
    fn sender_works_from_another_thread() {
        let printer = ExternalPrinter::new(4);
        let sender = printer.sender();
        std::thread::spawn(move || sender.send("hi".to_string()).unwrap())
            .join()
            .unwrap();
        assert_eq!(printer.try_recv().as_deref(), Some("hi"));
    }
}
