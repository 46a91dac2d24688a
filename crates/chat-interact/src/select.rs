//! Multiple-choice selection.
//!
//! A [`Selector`] offers a fixed list of [`Choice`]s and resolves to the value of the one the
//! user picks. Choices can be picked with reaction buttons, or in text mode by typing a label,
//! a 1-based position, or anything matching a choice's own pattern.
//!
//! [`select`] and [`confirm`] are the one-call forms.

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::sync::LazyLock;

use crate::action::{ActionEvent, ActionRegistry, TextPattern};
use crate::config::SessionConfig;
use crate::error::{InteractError, Result, TransportError};
use crate::gateway::Gateway;
use crate::session::{Interaction, Session, SessionContext};
use crate::types::{ChannelId, Content, Emoji, InvocationContext, StopReason};

/// Default glyph for "yes".
pub const YES_EMOJI: &str = "\u{2705}";
/// Default glyph for "no".
pub const NO_EMOJI: &str = "\u{274C}";

/// One option of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<T> {
    /// What selecting this choice returns.
    pub value: T,
    /// How the choice is shown, and the text that selects it.
    pub label: String,
    /// Reaction button, used in reaction mode.
    pub button: Option<Emoji>,
    /// Extra text that selects this choice, as a case-insensitive regex.
    pub pattern: Option<String>,
}

impl<T: Display> Choice<T> {
    /// A choice labelled with its value.
    pub fn new(value: T) -> Self {
        let label = value.to_string();
        Self::labeled(value, label)
    }
}

impl<T> Choice<T> {
    /// A choice with an explicit label.
    pub fn labeled(value: T, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            button: None,
            pattern: None,
        }
    }

    /// Set the reaction button.
    #[must_use]
    pub fn button(mut self, emoji: impl Into<Emoji>) -> Self {
        self.button = Some(emoji.into());
        self
    }

    /// Set an extra text pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

impl<T> Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.button {
            Some(button) => write!(f, "{button} = {}", self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// How the user answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Reaction buttons. Every choice needs a button and the bot must be able to react.
    Reactions,
    /// Typed replies.
    Text,
    /// Reactions when possible, text otherwise.
    #[default]
    Auto,
}

/// How the choice list is appended to the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChoiceLayout {
    /// One choice per line.
    #[default]
    Lines,
    /// All choices on one line.
    Inline,
}

/// Actions a selector's triggers resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    /// The button of the choice at this index.
    Choice(usize),
    /// A typed position.
    Number,
    /// Any other typed reply.
    Text,
}

static TEXT_ACTIONS: LazyLock<ActionRegistry<SelectAction>> = LazyLock::new(|| {
    crate::actions! {
        command(r"\s*([0-9]+)\s*") => SelectAction::Number,
        command(r"(?s)(.*)") => SelectAction::Text,
    }
});

static CONFIRM_REPLIES: LazyLock<ActionRegistry<bool>> = LazyLock::new(|| {
    crate::actions! {
        command(r"(?i)y(?:es)?") => true,
        command(r"(?i)no?") => false,
    }
});

enum Matcher {
    Label {
        label: TextPattern,
        pattern: Option<TextPattern>,
    },
    Reply(bool),
}

impl Matcher {
    fn matches(&self, input: &str) -> bool {
        match self {
            Self::Label { label, pattern } => {
                label.is_match(input) || pattern.as_ref().is_some_and(|p| p.is_match(input))
            }
            Self::Reply(value) => CONFIRM_REPLIES
                .resolve_text(input)
                .is_some_and(|(reply, _)| reply == *value),
        }
    }
}

/// A selection in progress. Implements [`Interaction`].
pub struct Selector<T> {
    prompt: Content,
    choices: Vec<Choice<T>>,
    matchers: Vec<Matcher>,
    mode: SelectMode,
    layout: ChoiceLayout,
    numbers: bool,
    config: SessionConfig,
    actions: ActionRegistry<SelectAction>,
    reactions: bool,
    selected: Option<usize>,
}

impl<T> Selector<T> {
    /// Create a selector.
    ///
    /// # Errors
    ///
    /// - [`InteractError::InvalidArgument`] if there are no choices.
    /// - [`InteractError::AmbiguousChoice`] if two choices share a button.
    /// - [`InteractError::InvalidPattern`] if a choice pattern does not compile.
    pub fn new(
        prompt: impl Into<Content>,
        choices: impl IntoIterator<Item = Choice<T>>,
    ) -> Result<Self> {
        let choices: Vec<Choice<T>> = choices.into_iter().collect();
        if choices.is_empty() {
            return Err(InteractError::invalid_argument("a selection needs at least one choice"));
        }

        let mut buttons = HashSet::new();
        for button in choices.iter().filter_map(|c| c.button.as_ref()) {
            if !buttons.insert(button) {
                return Err(InteractError::AmbiguousChoice {
                    glyph: button.to_string(),
                });
            }
        }

        let matchers = choices
            .iter()
            .map(|choice| {
                Ok(Matcher::Label {
                    label: TextPattern::literal(&choice.label)?,
                    pattern: choice
                        .pattern
                        .as_deref()
                        .map(TextPattern::case_insensitive)
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            prompt: prompt.into(),
            choices,
            matchers,
            mode: SelectMode::Auto,
            layout: ChoiceLayout::Lines,
            numbers: true,
            config: SessionConfig::default(),
            actions: ActionRegistry::new(),
            reactions: false,
            selected: None,
        })
    }

    /// Set the answer mode.
    #[must_use]
    pub const fn mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the choice layout.
    #[must_use]
    pub const fn layout(mut self, layout: ChoiceLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Accept or ignore typed positions.
    #[must_use]
    pub const fn numbers(mut self, enabled: bool) -> Self {
        self.numbers = enabled;
        self
    }

    /// Set the session config.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The choices.
    #[must_use]
    pub fn choices(&self) -> &[Choice<T>] {
        &self.choices
    }

    /// Whether reaction mode was chosen. Only meaningful after [`prepare`](Self::prepare).
    #[must_use]
    pub const fn uses_reactions(&self) -> bool {
        self.reactions
    }

    /// Index of the selected choice, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Decide between reactions and text for `channel` and build the trigger table.
    ///
    /// # Errors
    ///
    /// In [`SelectMode::Reactions`]: [`InteractError::InvalidArgument`] if a choice has no
    /// button, and a forbidden [`TransportError`] if the bot cannot react in `channel`.
    pub async fn prepare<G: Gateway>(&mut self, gateway: &G, channel: ChannelId) -> Result<()> {
        let all_buttons = self.choices.iter().all(|c| c.button.is_some());
        self.reactions = match self.mode {
            SelectMode::Text => false,
            SelectMode::Reactions => {
                if let Some(choice) = self.choices.iter().find(|c| c.button.is_none()) {
                    return Err(InteractError::invalid_argument(format!(
                        "choice '{}' has no button",
                        choice.label
                    )));
                }
                if !gateway.can_add_reactions(channel).await {
                    return Err(TransportError::forbidden("ADD_REACTIONS").into());
                }
                true
            }
            SelectMode::Auto => all_buttons && gateway.can_add_reactions(channel).await,
        };

        self.actions = if self.reactions {
            let mut actions = ActionRegistry::new();
            for (index, choice) in self.choices.iter().enumerate() {
                if let Some(button) = &choice.button {
                    actions.add_button(button.clone(), SelectAction::Choice(index));
                }
            }
            actions
        } else {
            TEXT_ACTIONS.clone()
        };
        tracing::debug!(reactions = self.reactions, choices = self.choices.len(), "selector prepared");
        Ok(())
    }

    /// The prompt with the choice list appended.
    #[must_use]
    pub fn render(&self) -> Content {
        let block = match (self.layout, self.reactions) {
            (ChoiceLayout::Lines, true) => self
                .choices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            (ChoiceLayout::Lines, false) => self
                .choices
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{} = {}", i + 1, c.label))
                .collect::<Vec<_>>()
                .join("\n"),
            (ChoiceLayout::Inline, true) => self
                .choices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" | "),
            (ChoiceLayout::Inline, false) => format!(
                "({})",
                self.choices
                    .iter()
                    .map(|c| c.label.to_lowercase())
                    .collect::<Vec<_>>()
                    .join("/")
            ),
        };
        self.prompt.clone().append_block(&block)
    }

    /// Indices of the choices a typed reply selects.
    #[must_use]
    pub fn matching(&self, input: &str) -> Vec<usize> {
        let input = input.trim();
        self.matchers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.matches(input))
            .map(|(i, _)| i)
            .collect()
    }

    /// Take the selected value out.
    fn into_selected(mut self) -> Option<T> {
        let index = self.selected?;
        Some(self.choices.swap_remove(index).value)
    }
}

impl<T: Send> Selector<T> {
    /// Run the selection as a session.
    ///
    /// Returns `Some(value)` when a choice was made and `None` when the session ended without
    /// one (stopped, or the message was deleted).
    ///
    /// # Errors
    ///
    /// - [`InteractError::TimedOut`] if the user never answered.
    /// - Anything [`prepare`](Self::prepare) or [`Session::start`] can return.
    pub async fn select<G: Gateway>(
        mut self,
        gateway: &G,
        invocation: &InvocationContext,
    ) -> Result<Option<T>> {
        self.prepare(gateway, invocation.channel).await?;
        let config = self.config.clone();
        let timeout = config.timeout;

        let mut session = Session::new(gateway, *invocation, self).with_config(config);
        let reason = session.start().await?;
        let selector = session.into_interaction();

        match (selector.selected, reason) {
            (None, StopReason::TimedOut) => Err(InteractError::timed_out(timeout, "a selection")),
            _ => Ok(selector.into_selected()),
        }
    }
}

impl Selector<bool> {
    /// A yes/no selector.
    ///
    /// Accepts the ✅/❌ buttons or typing `y`, `yes`, `n` or `no`; positions are ignored.
    #[must_use]
    pub fn confirmation(prompt: impl Into<Content>) -> Self {
        let choices = [
            Choice::labeled(true, "Yes")
                .button(YES_EMOJI)
                .pattern("y(?:es)?"),
            Choice::labeled(false, "No").button(NO_EMOJI).pattern("no?"),
        ];
        let matchers = vec![Matcher::Reply(true), Matcher::Reply(false)];
        Self {
            prompt: prompt.into(),
            choices: choices.into(),
            matchers,
            mode: SelectMode::Auto,
            layout: ChoiceLayout::Inline,
            numbers: false,
            config: SessionConfig::default(),
            actions: ActionRegistry::new(),
            reactions: false,
            selected: None,
        }
    }
}

impl<T: Send> Interaction for Selector<T> {
    type Action = SelectAction;

    fn actions(&self) -> &ActionRegistry<SelectAction> {
        &self.actions
    }

    async fn render_initial(&mut self) -> Result<Content> {
        Ok(self.render())
    }

    async fn handle<G: Gateway>(
        &mut self,
        action: SelectAction,
        event: ActionEvent,
        cx: &SessionContext<'_, G>,
    ) -> Result<()> {
        let notice = match action {
            SelectAction::Choice(index) => {
                self.selected = Some(index);
                None
            }
            SelectAction::Number if !self.numbers => None,
            SelectAction::Number => {
                let input = event.capture(0).unwrap_or_default();
                match input.parse::<usize>() {
                    Ok(n) if (1..=self.choices.len()).contains(&n) => {
                        self.selected = Some(n - 1);
                        None
                    }
                    _ => Some(format!(
                        "{input} is out of range. Please enter a number between 1 and {}.",
                        self.choices.len()
                    )),
                }
            }
            SelectAction::Text => {
                let input = event.capture(0).unwrap_or_default();
                match self.matching(input).as_slice() {
                    [] => None,
                    [index] => {
                        self.selected = Some(*index);
                        None
                    }
                    many => Some(format!(
                        "{} is ambiguous ({} matches). Please refine your input.",
                        input.trim(),
                        many.len()
                    )),
                }
            }
        };

        if let Some(index) = self.selected {
            tracing::debug!(index, label = %self.choices[index].label, "selected");
            cx.stop();
        } else if let Some(notice) = notice {
            if let Err(error) = cx.reply(notice).await {
                tracing::warn!(%error, "failed to send selection notice");
            }
        }
        Ok(())
    }
}

/// Ask the invoking user to pick one of `choices`.
///
/// See [`Selector::select`] for the outcomes.
pub async fn select<G: Gateway, T: Send>(
    gateway: &G,
    invocation: &InvocationContext,
    prompt: impl Into<Content>,
    choices: impl IntoIterator<Item = Choice<T>>,
    mode: SelectMode,
) -> Result<Option<T>> {
    Selector::new(prompt, choices)?
        .mode(mode)
        .select(gateway, invocation)
        .await
}

/// Ask a yes/no question.
///
/// Uses buttons when the bot may react in the channel, typed answers otherwise.
pub async fn confirm<G: Gateway>(
    gateway: &G,
    invocation: &InvocationContext,
    prompt: impl Into<Content>,
    config: SessionConfig,
) -> Result<Option<bool>> {
    Selector::confirmation(prompt)
        .config(config)
        .select(gateway, invocation)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Vec<Choice<&'static str>> {
        vec![
            Choice::new("red").button("\u{1F534}"),
            Choice::new("green").button("\u{1F7E2}").pattern("gr[ae]en|lime"),
            Choice::new("blue").button("\u{1F535}"),
        ]
    }

    #[test]
    fn duplicate_buttons_are_ambiguous() {
        let err = Selector::new("Pick", [
            Choice::new(1).button("\u{2B50}"),
            Choice::new(2).button("\u{2B50}"),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, InteractError::AmbiguousChoice { ref glyph } if glyph == "\u{2B50}"));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn empty_choices_are_invalid() {
        let err = Selector::<u8>::new("Pick", []).err().unwrap();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = Selector::new("Pick", [Choice::new(1).pattern("(")]).err().unwrap();
        assert!(matches!(err, InteractError::InvalidPattern { .. }));
    }

    #[test]
    fn text_matching_ignores_case() {
        let selector = Selector::new("Pick", colors()).unwrap();
        assert_eq!(selector.matching("RED"), [0]);
        assert_eq!(selector.matching("  Lime "), [1]);
        assert_eq!(selector.matching("grean"), [1]);
        assert!(selector.matching("purple").is_empty());
    }

    #[test]
    fn overlapping_patterns_match_several() {
        let selector = Selector::new("Pick", [
            Choice::new("apple").pattern("a.*"),
            Choice::new("avocado"),
        ])
        .unwrap();
        assert_eq!(selector.matching("avocado"), [0, 1]);
    }

    #[test]
    fn render_text_mode_lists_positions() {
        let selector = Selector::new(Content::text("Pick a color"), colors()).unwrap();
        assert_eq!(
            selector.render().text.as_deref(),
            Some("Pick a color\n1 = red\n2 = green\n3 = blue")
        );
    }

    #[test]
    fn confirmation_labels() {
        let confirm = Selector::confirmation("Sure?");
        assert_eq!(confirm.render().text.as_deref(), Some("Sure?\n(yes/no)"));
        assert_eq!(confirm.matching("YES"), [0]);
        assert_eq!(confirm.matching("n"), [1]);
        assert!(confirm.matching("nope").is_empty());
    }
}
