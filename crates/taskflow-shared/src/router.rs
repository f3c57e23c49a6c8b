//! Single-page view switching.
//!
//! The router owns the name → activation
//! table and the current view; everything
//! visual goes through [`ViewSurface`], so
//! the same router drives the terminal
//! controller and the browser app.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{
  debug,
  info
};

pub const LIST_VIEW: &str = "list";
pub const STATS_VIEW: &str = "stats";

/// The visual side of navigation.
pub trait ViewSurface {
  fn set_view_active(
    &mut self,
    view: &str,
    active: bool
  );

  /// Highlights the nav control for
  /// `view` and un-highlights the rest.
  fn set_nav_active(
    &mut self,
    view: &str
  );
}

/// Runs after a view becomes active. It
/// gets the surface so it can queue
/// follow-up work rather than reach for
/// globals.
pub type Activation<C> =
  Box<dyn FnMut(&mut C)>;

pub struct ViewRouter<C> {
  routes:  BTreeMap<String, Activation<C>>,
  current: String
}

impl<C> fmt::Debug for ViewRouter<C> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("ViewRouter")
      .field(
        "routes",
        &self.routes.keys().collect::<Vec<_>>()
      )
      .field("current", &self.current)
      .finish()
  }
}

impl<C> Default for ViewRouter<C> {
  fn default() -> Self {
    Self::new(LIST_VIEW)
  }
}

impl<C> ViewRouter<C> {
  pub fn new(
    default_view: impl Into<String>
  ) -> Self {
    Self {
      routes:  BTreeMap::new(),
      current: default_view.into()
    }
  }

  /// Adds a route; registering a name
  /// again replaces its activation.
  pub fn register<F>(
    &mut self,
    name: impl Into<String>,
    activation: F
  ) where
    F: FnMut(&mut C) + 'static
  {
    let name = name.into();
    if self
      .routes
      .insert(name.clone(), Box::new(activation))
      .is_some()
    {
      debug!(view = %name, "replaced view route");
    } else {
      debug!(view = %name, "registered view route");
    }
  }

  pub fn current_view(&self) -> &str {
    &self.current
  }
}

impl<C: ViewSurface> ViewRouter<C> {
  /// Switches to `name` and runs its
  /// activation synchronously. Unknown
  /// names are ignored and return
  /// `false`.
  #[tracing::instrument(skip(self, surface), fields(from = %self.current))]
  pub fn navigate(
    &mut self,
    name: &str,
    surface: &mut C
  ) -> bool {
    if !self.routes.contains_key(name) {
      debug!(
        view = name,
        "ignoring navigation to \
         unregistered view"
      );
      return false;
    }

    for view in self.routes.keys() {
      surface.set_view_active(view, false);
    }
    surface.set_view_active(name, true);
    surface.set_nav_active(name);
    self.current = name.to_string();
    info!(view = name, "navigated");

    if let Some(activation) =
      self.routes.get_mut(name)
    {
      activation(surface);
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use pretty_assertions::assert_eq;

  use super::{
    LIST_VIEW,
    STATS_VIEW,
    ViewRouter,
    ViewSurface
  };

  #[derive(Default)]
  struct Recorder {
    active:      BTreeSet<String>,
    nav:         Option<String>,
    activations: Vec<String>
  }

  impl ViewSurface for Recorder {
    fn set_view_active(
      &mut self,
      view: &str,
      active: bool
    ) {
      if active {
        self.active.insert(view.to_string());
      } else {
        self.active.remove(view);
      }
    }

    fn set_nav_active(
      &mut self,
      view: &str
    ) {
      self.nav = Some(view.to_string());
    }
  }

  fn router() -> ViewRouter<Recorder> {
    let mut router = ViewRouter::default();
    router.register(LIST_VIEW, |r: &mut Recorder| {
      r.activations.push("list".to_string())
    });
    router.register(STATS_VIEW, |r: &mut Recorder| {
      r.activations.push("stats".to_string())
    });
    router
  }

  #[test]
  fn starts_on_default_view() {
    let router = router();
    assert_eq!(router.current_view(), LIST_VIEW);
  }

  #[test]
  fn unregistered_target_is_a_no_op() {
    let mut router = router();
    let mut surface = Recorder::default();
    assert!(
      !router.navigate("unregistered", &mut surface)
    );
    assert_eq!(router.current_view(), LIST_VIEW);
    assert!(surface.activations.is_empty());
    assert!(surface.active.is_empty());
    assert_eq!(surface.nav, None);
  }

  #[test]
  fn navigate_runs_activation_once() {
    let mut router = router();
    let mut surface = Recorder::default();
    assert!(router.navigate(STATS_VIEW, &mut surface));
    assert_eq!(router.current_view(), STATS_VIEW);
    assert_eq!(surface.activations, vec!["stats"]);
    assert_eq!(
      surface.active.iter().cloned().collect::<Vec<_>>(),
      vec!["stats".to_string()]
    );
    assert_eq!(surface.nav.as_deref(), Some(STATS_VIEW));
  }

  #[test]
  fn switching_back_deactivates_previous() {
    let mut router = router();
    let mut surface = Recorder::default();
    router.navigate(STATS_VIEW, &mut surface);
    router.navigate(LIST_VIEW, &mut surface);
    assert!(!surface.active.contains(STATS_VIEW));
    assert!(surface.active.contains(LIST_VIEW));
    assert_eq!(surface.activations, vec!["stats", "list"]);
  }

  #[test]
  fn last_registration_wins() {
    let mut router = router();
    router.register(STATS_VIEW, |r: &mut Recorder| {
      r.activations.push("stats-v2".to_string())
    });
    let mut surface = Recorder::default();
    router.navigate(STATS_VIEW, &mut surface);
    assert_eq!(surface.activations, vec!["stats-v2"]);
  }

  #[test]
  fn unknown_after_known_keeps_last_view() {
    let mut router = router();
    let mut surface = Recorder::default();
    router.navigate(STATS_VIEW, &mut surface);
    router.navigate("settings", &mut surface);
    assert_eq!(router.current_view(), STATS_VIEW);
    assert_eq!(surface.activations.len(), 1);
  }
}
