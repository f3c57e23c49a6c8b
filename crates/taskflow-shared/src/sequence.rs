use std::cell::Cell;

use tracing::debug;

/// Generation tag handed out when a list
/// load starts.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct LoadTicket(u64);

/// Tags list loads so that a response
/// arriving after a newer request was
/// issued is dropped instead of
/// overwriting fresher results.
///
/// Uses a `Cell` so the browser app can
/// share one sequence between callbacks
/// through an `Rc`.
#[derive(Debug, Default)]
pub struct LoadSequence {
  latest: Cell<u64>
}

impl LoadSequence {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn begin(&self) -> LoadTicket {
    let next =
      self.latest.get().wrapping_add(1);
    self.latest.set(next);
    LoadTicket(next)
  }

  pub fn is_current(
    &self,
    ticket: LoadTicket
  ) -> bool {
    let current =
      ticket.0 == self.latest.get();
    if !current {
      debug!(
        ticket = ticket.0,
        latest = self.latest.get(),
        "discarding stale load"
      );
    }
    current
  }
}

#[cfg(test)]
mod tests {
  use super::LoadSequence;

  #[test]
  fn only_newest_ticket_is_current() {
    let seq = LoadSequence::new();
    let first = seq.begin();
    assert!(seq.is_current(first));
    let second = seq.begin();
    assert!(!seq.is_current(first));
    assert!(seq.is_current(second));
  }
}
