//! Preview session: invalidation tickets and stale-result rejection

use crate::config::{PaginationConfig, DEFAULT_SETTLE_MS};
use crate::document::ContentDocument;
use crate::error::{PaginationError, Result};
use crate::layout::{paginate, LayoutOracle, PageGeometry, Typography};
use crate::render::{FooterTemplate, PageSet};

/// What changed since the last pagination
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Document markup was edited
    Content,
    /// Paper, margins or footer band changed
    Geometry(PageGeometry),
    /// Fonts or spacing of the measurement container changed
    Typography(Typography),
}

/// Identifies the generation a pagination run was started for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of handing a finished run back to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Accepted,
    /// A newer invalidation arrived while the run was in flight
    Superseded { latest: u64 },
}

/// Holds the current page set and rejects results computed for
/// content or geometry that has since changed.
#[derive(Debug)]
pub struct PreviewSession {
    geometry: PageGeometry,
    typography: Typography,
    footer: FooterTemplate,
    generation: u64,
    pages: Option<PageSet>,
    dirty: bool,
}

impl PreviewSession {
    pub fn new(geometry: PageGeometry, typography: Typography) -> Self {
        Self {
            geometry,
            typography,
            footer: FooterTemplate::default(),
            generation: 0,
            pages: None,
            dirty: true,
        }
    }

    pub fn from_config(config: &PaginationConfig) -> Result<Self> {
        let mut session = Self::new(config.geometry()?, config.typography.clone());
        session.footer = config.footer_template()?;
        Ok(session)
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn footer(&self) -> &FooterTemplate {
        &self.footer
    }

    pub fn set_footer(&mut self, footer: FooterTemplate) {
        self.footer = footer;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last accepted page set
    pub fn pages(&self) -> Option<&PageSet> {
        self.pages.as_ref()
    }

    /// Check if the stored pages are out of date
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ticket for the current generation
    pub fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
        }
    }

    /// Record a change. Any run started before this call is superseded.
    pub fn invalidate(&mut self, change: Change) -> Ticket {
        match change {
            Change::Content => {}
            Change::Geometry(geometry) => self.geometry = geometry,
            Change::Typography(typography) => self.typography = typography,
        }
        self.generation += 1;
        self.dirty = true;
        self.ticket()
    }

    /// Hand back the result of a run started with `ticket`.
    ///
    /// Stale results are dropped whether they succeeded or not. A failed run
    /// for the current generation leaves the previous pages in place.
    pub fn complete(&mut self, ticket: Ticket, result: Result<PageSet>) -> Result<Completion> {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding pagination for generation {} (latest {})",
                ticket.generation,
                self.generation
            );
            return Ok(Completion::Superseded {
                latest: self.generation,
            });
        }

        self.pages = Some(result?);
        self.dirty = false;
        Ok(Completion::Accepted)
    }

    /// Like [`complete`](Self::complete) but treats a stale result as an error
    /// and returns the accepted pages.
    pub fn accept(&mut self, ticket: Ticket, result: Result<PageSet>) -> Result<&PageSet> {
        match self.complete(ticket, result)? {
            Completion::Superseded { latest } => Err(PaginationError::Superseded { latest }),
            Completion::Accepted => self.pages.as_ref().ok_or(PaginationError::Superseded {
                latest: self.generation,
            }),
        }
    }

    /// Paginate `document` synchronously for the current generation
    pub fn refresh<O: LayoutOracle + ?Sized>(
        &mut self,
        document: &ContentDocument,
        oracle: &mut O,
    ) -> Result<&PageSet> {
        let ticket = self.ticket();
        let result = paginate(document, &self.geometry, &self.typography, oracle);
        self.accept(ticket, result)
    }
}

/// Settle delay between the last edit and re-pagination.
///
/// Time is supplied by the caller in milliseconds so the logic stays
/// independent of any clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    settle_ms: u64,
    last_edit: Option<u64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_MS)
    }
}

impl Debouncer {
    pub fn new(settle_ms: u64) -> Self {
        Self {
            settle_ms,
            last_edit: None,
        }
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms
    }

    /// Record an edit at `now`, restarting the delay
    pub fn poke(&mut self, now: u64) {
        self.last_edit = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    /// Whether the settle delay has elapsed since the last edit
    pub fn ready(&self, now: u64) -> bool {
        self.last_edit
            .is_some_and(|edit| now.saturating_sub(edit) >= self.settle_ms)
    }

    /// Consume the pending edit if it has settled
    pub fn take(&mut self, now: u64) -> bool {
        if self.ready(now) {
            self.last_edit = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::oracle::testing::StubOracle;

    fn session() -> PreviewSession {
        PreviewSession::new(PageGeometry::default(), Typography::default())
    }

    fn pages(content: &str) -> Result<PageSet> {
        let doc = ContentDocument::parse(content);
        let mut oracle = StubOracle::new(10.0);
        paginate(&doc, &PageGeometry::default(), &Typography::default(), &mut oracle)
    }

    #[test]
    fn test_latest_ticket_accepted() {
        let mut session = session();
        assert!(session.is_dirty());

        let ticket = session.invalidate(Change::Content);
        let outcome = session.complete(ticket, pages("<p>a</p>")).unwrap();
        assert_eq!(outcome, Completion::Accepted);
        assert!(!session.is_dirty());
        assert_eq!(session.pages().unwrap().total_pages(), 1);
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut session = session();
        let first = session.invalidate(Change::Content);
        let second = session.invalidate(Change::Content);

        let outcome = session.complete(first, pages("<p>old</p>")).unwrap();
        assert_eq!(outcome, Completion::Superseded { latest: 2 });
        assert!(session.pages().is_none());
        assert!(session.is_dirty());

        session.complete(second, pages("<p>new</p>")).unwrap();
        assert_eq!(session.pages().unwrap().pages()[0].markup, "<p>new</p>");
    }

    #[test]
    fn test_stale_error_is_also_discarded() {
        let mut session = session();
        let stale = session.ticket();
        session.invalidate(Change::Content);
        let outcome = session
            .complete(stale, Err(PaginationError::LayoutUnavailable))
            .unwrap();
        assert!(matches!(outcome, Completion::Superseded { .. }));
    }

    #[test]
    fn test_failed_run_keeps_previous_pages() {
        let mut session = session();
        let ticket = session.invalidate(Change::Content);
        session.complete(ticket, pages("<p>kept</p>")).unwrap();

        let ticket = session.invalidate(Change::Content);
        assert!(session
            .complete(ticket, Err(PaginationError::LayoutUnavailable))
            .is_err());
        assert_eq!(session.pages().unwrap().pages()[0].markup, "<p>kept</p>");
        assert!(session.is_dirty());
    }

    #[test]
    fn test_accept_reports_superseded() {
        let mut session = session();
        let stale = session.ticket();
        session.invalidate(Change::Content);
        assert!(matches!(
            session.accept(stale, pages("<p>x</p>")),
            Err(PaginationError::Superseded { latest: 1 })
        ));
    }

    #[test]
    fn test_geometry_change_applies() {
        let mut session = session();
        let geometry = PageGeometry {
            footer_height: 0.0,
            ..PageGeometry::default()
        };
        let ticket = session.invalidate(Change::Geometry(geometry));
        assert_eq!(ticket.generation(), 1);
        assert_eq!(session.geometry().footer_height, 0.0);
    }

    #[test]
    fn test_refresh() {
        let mut session = session();
        let doc = ContentDocument::parse("<p>a</p><!-- pagebreak --><p>b</p>");
        let mut oracle = StubOracle::new(10.0);
        let set = session.refresh(&doc, &mut oracle).unwrap();
        assert_eq!(set.total_pages(), 2);
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_debouncer() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.ready(1_000));

        debouncer.poke(1_000);
        assert!(!debouncer.ready(1_200));
        debouncer.poke(1_200);
        assert!(!debouncer.ready(1_450));
        assert!(debouncer.ready(1_500));

        assert!(debouncer.take(1_500));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take(2_000));
    }
}
