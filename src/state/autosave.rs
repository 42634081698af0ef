use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

/// Debounced save timer for one editor.
///
/// Every [`Autosave::schedule`] cancels the pending timer and starts a new
/// one, so only the last edit in a burst is saved. Call
/// [`Autosave::cancel`] from the editor's cleanup.
#[derive(Clone)]
pub(crate) struct Autosave {
    delay_ms: i32,
    timer: Arc<Mutex<Option<i32>>>,
}

impl Autosave {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms: i32::try_from(delay_ms).unwrap_or(i32::MAX),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    pub fn delay_ms(&self) -> i32 {
        self.delay_ms
    }

    pub fn is_pending(&self) -> bool {
        self.timer.lock().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn schedule(&self, save: impl FnOnce() + 'static) {
        let Some(win) = web_sys::window() else {
            return;
        };

        self.cancel();

        let timer = self.timer.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            if let Ok(mut t) = timer.lock() {
                *t = None;
            }
            save();
        });

        let tid = match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            self.delay_ms,
        ) {
            Ok(tid) => tid,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to schedule autosave");
                return;
            }
        };

        if let Ok(mut t) = self.timer.lock() {
            *t = Some(tid);
        }
    }

    pub fn cancel(&self) {
        let pending = self.timer.lock().ok().and_then(|mut t| t.take());
        let Some(tid) = pending else {
            return;
        };
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(tid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_saturates() {
        assert_eq!(Autosave::new(1500).delay_ms(), 1500);
        assert_eq!(Autosave::new(u32::MAX).delay_ms(), i32::MAX);
    }

    #[test]
    fn test_new_has_nothing_pending() {
        let a = Autosave::new(100);
        assert!(!a.is_pending());
        a.cancel();
        assert!(!a.is_pending());
    }
}
