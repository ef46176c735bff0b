use std::fmt;

use tracing::debug;

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Feed,
    People,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Feed => "/",
            Self::People => "/people",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/login" => Some(Self::Login),
            "/register" => Some(Self::Register),
            "/" => Some(Self::Feed),
            "/people" => Some(Self::People),
            _ => None,
        }
    }

    /// Routes that need a token to render.
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Feed | Self::People)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect { to: Route, replace: bool },
}

/// Gate protected routes on the session. Without a token the answer is a
/// history-replacing redirect to the login view.
pub fn guard(session: &SessionState, requested: Route) -> Navigation {
    if requested.is_protected() && !session.is_signed_in() {
        debug!(route = %requested, "no token, redirecting to login");
        Navigation::Redirect {
            to: Route::Login,
            replace: true,
        }
    } else {
        Navigation::Render(requested)
    }
}

/// Navigation history, enough to tell a push from a replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Route>,
}

impl History {
    pub fn new(start: Route) -> Self {
        Self {
            entries: vec![start],
        }
    }

    pub fn current(&self) -> Route {
        // never empty: created with one entry and `back` keeps the first
        self.entries.last().copied().unwrap_or(Route::Login)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    pub fn push(&mut self, route: Route) {
        self.entries.push(route);
    }

    pub fn replace(&mut self, route: Route) {
        match self.entries.last_mut() {
            Some(last) => *last = route,
            None => self.entries.push(route),
        }
    }

    pub fn back(&mut self) -> Route {
        if self.entries.len() > 1 {
            self.entries.pop();
        }
        self.current()
    }

    /// Push `route`, run it through the guard and apply any redirect.
    /// Returns the route that ends up rendered.
    pub fn navigate(&mut self, session: &SessionState, route: Route) -> Route {
        self.push(route);
        self.settle(session)
    }

    /// Re-evaluate the current entry, e.g. after a logout.
    pub fn settle(&mut self, session: &SessionState) -> Route {
        match guard(session, self.current()) {
            Navigation::Render(route) => route,
            Navigation::Redirect { to, replace: true } => {
                self.replace(to);
                to
            }
            Navigation::Redirect { to, replace: false } => {
                self.push(to);
                to
            }
        }
    }
}
