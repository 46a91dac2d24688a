//! Paginated browsing.
//!
//! A [`Paginator`] shows one page of a [`PageSource`] at a time and moves between pages with
//! reaction buttons. Sources can be in-memory lists, iterators or async streams; lazy sources
//! are only pulled as far as the user browses.
//!
//! # Example
//!
//! ```ignore
//! use chat_interact::paginator::Paginator;
//!
//! let reason = Paginator::chunked(log_lines, 10)?
//!     .config(SessionConfig::new().timeout(Duration::from_secs(120)))
//!     .run(&gateway, &ctx)
//!     .await?;
//! ```

pub mod cursor;
pub mod source;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::LazyLock;

pub use cursor::Cursor;
pub use source::{IterSource, PageSource, StreamSource};

use crate::action::{ActionEvent, ActionRegistry};
use crate::config::{PaginatorButtons, SessionConfig};
use crate::error::{InteractError, Result};
use crate::gateway::Gateway;
use crate::session::{Interaction, Session, SessionContext};
use crate::types::{Content, Embed, InvocationContext, StopReason};

/// Navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginatorAction {
    /// Go to the first page.
    First,
    /// Go one page back.
    Previous,
    /// Go one page forward.
    Next,
    /// Go to the last known page.
    Last,
    /// End the session.
    Stop,
}

static DEFAULT_ACTIONS: LazyLock<ActionRegistry<PaginatorAction>> =
    LazyLock::new(|| navigation(&PaginatorButtons::default()));

/// Bind the five navigation buttons in display order. A glyph given twice keeps only its
/// last action.
fn navigation(buttons: &PaginatorButtons) -> ActionRegistry<PaginatorAction> {
    let mut actions = ActionRegistry::new();
    actions.add_button(buttons.first.clone(), PaginatorAction::First);
    actions.add_button(buttons.previous.clone(), PaginatorAction::Previous);
    actions.add_button(buttons.next.clone(), PaginatorAction::Next);
    actions.add_button(buttons.last.clone(), PaginatorAction::Last);
    actions.add_button(buttons.stop.clone(), PaginatorAction::Stop);
    actions
}

/// Where a page sits, as passed to formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: usize,
    /// Total number of pages, if known when the page was rendered.
    pub total: Option<usize>,
}

impl PageInfo {
    /// One-based page number.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.index + 1
    }
}

impl Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "Page {}/{total}", self.number()),
            None => write!(f, "Page {}", self.number()),
        }
    }
}

/// Turns a page into message content.
pub type PageFormatter<P> = Box<dyn FnMut(&P, PageInfo) -> Content + Send>;

/// Render a single item as an embed with a page footer.
pub fn page_embed<T: Display + ?Sized>(page: &T, info: PageInfo) -> Content {
    Content::embed(
        Embed::new()
            .description(page.to_string())
            .footer(info.to_string()),
    )
}

/// Render a chunk as an embed listing one item per line, with a page footer.
pub fn chunk_embed<T: Display>(chunk: &[T], info: PageInfo) -> Content {
    let lines: Vec<String> = chunk.iter().map(ToString::to_string).collect();
    Content::embed(
        Embed::new()
            .description(lines.join("\n"))
            .footer(info.to_string()),
    )
}

/// A session that browses pages. Implements [`Interaction`].
pub struct Paginator<S: PageSource> {
    source: S,
    formatter: PageFormatter<S::Page>,
    rendered: HashMap<usize, Content>,
    cursor: Cursor,
    buttons: PaginatorButtons,
    actions: Cow<'static, ActionRegistry<PaginatorAction>>,
    config: SessionConfig,
}

impl<S: PageSource> Paginator<S> {
    /// Create a paginator over `source`.
    pub fn new(
        source: S,
        formatter: impl FnMut(&S::Page, PageInfo) -> Content + Send + 'static,
    ) -> Self {
        Self {
            source,
            formatter: Box::new(formatter),
            rendered: HashMap::new(),
            cursor: Cursor::new(),
            buttons: PaginatorButtons::default(),
            actions: Cow::Borrowed(&*DEFAULT_ACTIONS),
            config: SessionConfig::default(),
        }
    }

    /// Use other navigation glyphs.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidArgument`] if two buttons share a glyph.
    pub fn buttons(mut self, buttons: PaginatorButtons) -> Result<Self> {
        self.actions = if buttons.is_default() {
            Cow::Borrowed(&*DEFAULT_ACTIONS)
        } else {
            let actions = navigation(&buttons);
            if actions.len() < 5 {
                return Err(InteractError::invalid_argument(
                    "paginator buttons must be distinct",
                ));
            }
            Cow::Owned(actions)
        };
        self.buttons = buttons;
        Ok(self)
    }

    /// Set the session config.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The cursor.
    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// The page source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Check that page `index` exists and update what the cursor knows.
    async fn probe(&mut self, index: usize) -> Result<bool> {
        let exists = self.source.get_page(index).await?.is_some();
        if exists {
            self.cursor.found(index);
        }
        match self.source.known_len() {
            Some(total) => self.cursor.end_at(total),
            None if !exists => self.cursor.end_at(index),
            None => {}
        }
        Ok(exists)
    }

    /// Locate the first pages and render the first one.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidArgument`] if the source has no pages.
    pub async fn prepare(&mut self) -> Result<Content> {
        if !self.probe(0).await? {
            return Err(InteractError::invalid_argument("nothing to paginate"));
        }
        if self.cursor.next_candidate().is_some() {
            self.probe(1).await?;
        }
        if self.cursor.is_single() {
            let mut actions = ActionRegistry::new();
            actions.add_button(self.buttons.stop.clone(), PaginatorAction::Stop);
            self.actions = Cow::Owned(actions);
        }
        tracing::debug!(known = self.cursor.known(), total = ?self.cursor.total(), "paginator prepared");
        self.render_current().await
    }

    /// Move the cursor. Returns whether the page changed.
    ///
    /// `Next` pulls the following page from the source first; every other move stays within
    /// pages already seen. `Stop` never moves.
    pub async fn navigate(&mut self, action: PaginatorAction) -> Result<bool> {
        let moved = match action {
            PaginatorAction::First => self.cursor.first(),
            PaginatorAction::Previous => self.cursor.previous(),
            PaginatorAction::Last => self.cursor.last(),
            PaginatorAction::Stop => false,
            PaginatorAction::Next => match self.cursor.next_candidate() {
                Some(next) if self.probe(next).await? => self.cursor.seek(next),
                _ => false,
            },
        };
        Ok(moved)
    }

    /// Content of the current page. Each page is formatted at most once.
    pub async fn render_current(&mut self) -> Result<Content> {
        let index = self.cursor.index();
        if let Some(content) = self.rendered.get(&index) {
            return Ok(content.clone());
        }

        let info = PageInfo {
            index,
            total: self.cursor.total(),
        };
        let Some(page) = self.source.get_page(index).await? else {
            return Err(InteractError::invalid_argument(format!(
                "page {} does not exist",
                info.number()
            )));
        };
        let content = (self.formatter)(page, info);
        self.rendered.insert(index, content.clone());
        Ok(content)
    }
}

impl<S: PageSource> Paginator<S> {
    /// Run the paginator as a session until it is stopped, times out or its message is
    /// deleted.
    pub async fn run<G: Gateway>(
        self,
        gateway: &G,
        invocation: &InvocationContext,
    ) -> Result<StopReason> {
        let config = self.config.clone();
        Session::new(gateway, *invocation, self)
            .with_config(config)
            .start()
            .await
    }
}

impl<T: Display + Send + 'static> Paginator<IterSource<T>> {
    /// One item per page, rendered with [`page_embed`].
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(IterSource::new(items), page_embed)
    }
}

impl<T: Display + Send + 'static> Paginator<IterSource<Vec<T>>> {
    /// `size` items per page, rendered with [`chunk_embed`].
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidArgument`] if `size` is zero.
    pub fn chunked<I>(items: I, size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Ok(Self::new(
            IterSource::chunked(items, size)?,
            |chunk: &Vec<T>, info| chunk_embed(chunk, info),
        ))
    }
}

impl<S: PageSource> Interaction for Paginator<S> {
    type Action = PaginatorAction;

    fn actions(&self) -> &ActionRegistry<PaginatorAction> {
        &self.actions
    }

    async fn render_initial(&mut self) -> Result<Content> {
        self.prepare().await
    }

    async fn handle<G: Gateway>(
        &mut self,
        action: PaginatorAction,
        _event: ActionEvent,
        cx: &SessionContext<'_, G>,
    ) -> Result<()> {
        if action == PaginatorAction::Stop {
            cx.stop();
            return Ok(());
        }
        if self.navigate(action).await? {
            tracing::debug!(page = self.cursor.index() + 1, ?action, "page turned");
            let content = self.render_current().await?;
            cx.edit(&content).await?;
        }
        Ok(())
    }
}

impl<S: PageSource> fmt::Debug for Paginator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("cursor", &self.cursor)
            .field("rendered", &self.rendered.len())
            .field("buttons", &self.buttons)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::executor::block_on;

    use super::*;
    use crate::types::Emoji;

    fn counted(items: Vec<&'static str>, calls: &Arc<AtomicUsize>) -> Paginator<Vec<&'static str>> {
        let calls = Arc::clone(calls);
        Paginator::new(items, move |page: &&str, info| {
            calls.fetch_add(1, Ordering::SeqCst);
            page_embed(*page, info)
        })
    }

    #[test]
    fn page_info_footer() {
        assert_eq!(PageInfo { index: 0, total: Some(3) }.to_string(), "Page 1/3");
        assert_eq!(PageInfo { index: 4, total: None }.to_string(), "Page 5");
    }

    #[test]
    fn empty_source_is_rejected() {
        let mut paginator = Paginator::from_items(Vec::<String>::new());
        let err = block_on(paginator.prepare()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn single_page_only_stops() {
        let mut paginator = Paginator::from_items(["only"]);
        block_on(paginator.prepare()).unwrap();
        let buttons: Vec<&Emoji> = paginator.actions().buttons().collect();
        assert_eq!(buttons, [&Emoji::from(crate::config::STOP_EMOJI)]);
    }

    #[test]
    fn pages_are_formatted_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut paginator = counted(vec!["a", "b", "c"], &calls);
        block_on(async {
            paginator.prepare().await.unwrap();
            assert!(paginator.navigate(PaginatorAction::Next).await.unwrap());
            paginator.render_current().await.unwrap();
            assert!(paginator.navigate(PaginatorAction::First).await.unwrap());
            paginator.render_current().await.unwrap();
            assert!(paginator.navigate(PaginatorAction::Next).await.unwrap());
            paginator.render_current().await.unwrap();
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lazy_next_and_last() {
        let mut paginator = Paginator::from_items((1..=4).map(|n| n * 10));
        block_on(async {
            let first = paginator.prepare().await.unwrap();
            assert_eq!(
                first.embed.and_then(|e| e.footer).as_deref(),
                Some("Page 1")
            );
            // Only pages 1 and 2 have been seen.
            assert!(paginator.navigate(PaginatorAction::Last).await.unwrap());
            assert_eq!(paginator.cursor().index(), 1);

            while paginator.navigate(PaginatorAction::Next).await.unwrap() {}
            assert_eq!(paginator.cursor().index(), 3);
            assert_eq!(paginator.cursor().total(), Some(4));

            assert!(!paginator.navigate(PaginatorAction::Next).await.unwrap());
            assert!(!paginator.navigate(PaginatorAction::Stop).await.unwrap());
        });
    }

    #[test]
    fn default_table_follows_configured_glyphs() {
        use crate::config::{FIRST_EMOJI, LAST_EMOJI, NEXT_EMOJI, PREVIOUS_EMOJI, STOP_EMOJI};

        let paginator = Paginator::from_items(["a", "b"]);
        let glyphs: Vec<String> = paginator.actions().buttons().map(ToString::to_string).collect();
        assert_eq!(
            glyphs,
            [FIRST_EMOJI, PREVIOUS_EMOJI, NEXT_EMOJI, LAST_EMOJI, STOP_EMOJI]
        );
        assert_eq!(
            paginator
                .actions()
                .resolve_reaction(&Emoji::from(LAST_EMOJI), crate::action::ButtonPhase::Press),
            Some(PaginatorAction::Last)
        );
    }

    #[test]
    fn duplicate_custom_buttons_are_rejected() {
        let buttons = PaginatorButtons {
            next: Emoji::from("\u{25C0}"),
            ..PaginatorButtons::default()
        };
        let err = Paginator::from_items(["a"]).buttons(buttons).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn custom_buttons_replace_defaults() {
        let buttons = PaginatorButtons {
            stop: Emoji::from("\u{1F6D1}"),
            ..PaginatorButtons::default()
        };
        let paginator = Paginator::from_items(["a", "b"]).buttons(buttons).unwrap();
        assert_eq!(paginator.actions().buttons().count(), 5);
        assert_eq!(
            paginator
                .actions()
                .resolve_reaction(&Emoji::from("\u{1F6D1}"), crate::action::ButtonPhase::Press),
            Some(PaginatorAction::Stop)
        );
    }
}
