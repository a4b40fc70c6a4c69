//! Loading/data/error triple published to views.

/// State of a fetched resource.
///
/// `loading` is set only between issuing a fetch and its settlement. A new
/// fetch clears the previous error. A failed fetch leaves `data` as it was,
/// so a transient failure does not blank a populated view.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> RequestState<T> {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        let mut state = RequestState::<u8>::default();
        state.begin();
        assert!(state.loading);

        state.succeed(3);
        assert_eq!(state.data, Some(3));
        assert!(!state.loading);

        state.begin();
        state.fail("timeout".into());
        assert_eq!(state.data, Some(3));
        assert_eq!(state.error.as_deref(), Some("timeout"));

        state.begin();
        assert_eq!(state.error, None);
    }
}
