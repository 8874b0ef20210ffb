/// The local clipboard now holds text it did not hold before.
///
/// Emitted by clipboard watchers; consumers decide whether it is a new value
/// or the echo of a value they wrote themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClipboardChanged(pub String);

impl LocalClipboardChanged {
    pub fn into_text(self) -> String {
        self.0
    }
}
