//! Tracks the selected city and discards stale results.
//!
//! Every selection (or refresh) hands out a [`Ticket`]. Fetches run
//! independently and report back with their ticket; only the ticket of the
//! latest selection is allowed to change what is shown, so a slow response
//! for a previously selected city never overwrites the current one.

use tracing::debug;

use crate::assemble::{AssembleError, DashboardView};

/// Proof of which selection a fetch was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    city: String,
}

impl Ticket {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What presentation should show right now.
#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Loading {
        city: String,
    },
    Ready(Box<DashboardView>),
    Failed {
        city: String,
        message: String,
        retryable: bool,
    },
}

#[derive(Debug)]
pub struct Session {
    generation: u64,
    selected: Option<String>,
    state: ViewState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            generation: 0,
            selected: None,
            state: ViewState::Idle,
        }
    }

    /// Selects `city` and returns the ticket its fetch must report with.
    /// Any result still in flight for an earlier selection becomes stale.
    pub fn select(&mut self, city: impl Into<String>) -> Ticket {
        let city = city.into();
        self.generation += 1;
        self.selected = Some(city.clone());
        self.state = ViewState::Loading { city: city.clone() };

        Ticket {
            generation: self.generation,
            city,
        }
    }

    /// Re-selects the current city. `None` when nothing is selected.
    pub fn refresh(&mut self) -> Option<Ticket> {
        let city = self.selected.clone()?;
        Some(self.select(city))
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Applies a finished fetch. Returns `false` (and changes nothing) when
    /// the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<DashboardView, AssembleError>,
    ) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                city = %ticket.city,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale result"
            );
            return false;
        }

        self.state = match result {
            Ok(view) => ViewState::Ready(Box::new(view)),
            Err(err) => ViewState::Failed {
                city: ticket.city,
                message: err.user_message(),
                retryable: err.is_retryable(),
            },
        };
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match &self.state {
            ViewState::Ready(view) => Some(view.as_ref()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading { .. })
    }
}
