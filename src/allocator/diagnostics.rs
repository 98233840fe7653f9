use log::error;

/// Channel the allocator writes one line to for every failed
/// request. It only surfaces text; nothing in the allocator
/// depends on what happens to the line.
pub trait Diagnostics {
    fn report(&mut self, message: &str);
}

/// Sends reports to the `log` facade at the error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, message: &str) {
        error!("{message}");
    }
}

/// Keeps every report, in order. Useful to inspect what an
/// allocator complained about.
impl Diagnostics for Vec<String> {
    fn report(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn report(&mut self, message: &str) {
        (**self).report(message);
    }
}
