/// Status of a value that has to be fetched before it can be shown.
///
/// ```text
///   None ──load──► Loading ──ok──► Content { value, update: None }
///                     └────err──► Failure(e)
///
///   Content ──refresh──► Content { update: Some(Update::Loading) }
///                            ├─ok──► Content { new value, update: None }
///                            └─err─► Content { old value, update: Some(Update::Failure(e)) }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrState<E, V> {
    /// Nothing to show yet, a fetch is in flight.
    Loading,
    /// A value is available. `update` tracks a refresh of it, if any.
    Content {
        value: V,
        update: Option<Update<E>>,
    },
    /// The initial fetch failed.
    Failure(E),
}

/// Refresh status attached to [`GrState::Content`].
///
/// There is deliberately no content case: a refresh never carries a value
/// of its own, the last good value stays in `Content::value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Update<E> {
    Loading,
    Failure(E),
}

impl<E> Update<E> {
    pub fn is_running(&self) -> bool {
        matches!(self, Update::Loading)
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            Update::Failure(error) => Some(error),
            Update::Loading => None,
        }
    }
}

impl<E, V> GrState<E, V> {
    /// Settled content with no refresh attached.
    pub fn content(value: V) -> Self {
        GrState::Content {
            value,
            update: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GrState::Loading)
    }

    pub fn is_content(&self) -> bool {
        matches!(self, GrState::Content { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GrState::Failure(_))
    }

    /// Content whose refresh is in flight.
    pub fn is_update_running(&self) -> bool {
        matches!(
            self,
            GrState::Content {
                update: Some(Update::Loading),
                ..
            }
        )
    }

    /// Either the first fetch or a refresh is in flight.
    pub fn is_loading_or_update(&self) -> bool {
        self.is_loading() || self.is_update_running()
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            GrState::Content { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            GrState::Content { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Error of a failed first fetch. A failed refresh is reported through
    /// [`update`](Self::update) instead.
    pub fn failure(&self) -> Option<&E> {
        match self {
            GrState::Failure(error) => Some(error),
            _ => None,
        }
    }

    pub fn update(&self) -> Option<&Update<E>> {
        match self {
            GrState::Content { update, .. } => update.as_ref(),
            _ => None,
        }
    }

    pub fn map<V2>(self, f: impl FnOnce(V) -> V2) -> GrState<E, V2> {
        match self {
            GrState::Loading => GrState::Loading,
            GrState::Content { value, update } => GrState::Content {
                value: f(value),
                update,
            },
            GrState::Failure(error) => GrState::Failure(error),
        }
    }

    /// The content value, `placeholder()` while loading, `None` on failure.
    pub fn map_loading(self, placeholder: impl FnOnce() -> V) -> Option<V> {
        match self {
            GrState::Loading => Some(placeholder()),
            GrState::Content { value, .. } => Some(value),
            GrState::Failure(_) => None,
        }
    }

    /// Chains a state that depends on this one's content. `f` may return
    /// `None` for "not started".
    pub fn and_then<V2>(self, f: impl FnOnce(V) -> Option<GrState<E, V2>>) -> Option<GrState<E, V2>> {
        match self {
            GrState::Loading => Some(GrState::Loading),
            GrState::Content { value, .. } => f(value),
            GrState::Failure(error) => Some(GrState::Failure(error)),
        }
    }

    /// Replaces the refresh status of content; other states are returned
    /// unchanged.
    pub fn with_update(self, update: Option<Update<E>>) -> Self {
        match self {
            GrState::Content { value, .. } => GrState::Content { value, update },
            other => other,
        }
    }

    /// Applies the outcome of a refresh to content: success replaces the
    /// value, failure keeps it and records the error. Other states are
    /// returned unchanged.
    pub fn settle_refresh(self, result: Result<V, E>) -> Self {
        match (self, result) {
            (GrState::Content { .. }, Ok(value)) => GrState::content(value),
            (GrState::Content { value, .. }, Err(error)) => GrState::Content {
                value,
                update: Some(Update::Failure(error)),
            },
            (other, _) => other,
        }
    }
}
