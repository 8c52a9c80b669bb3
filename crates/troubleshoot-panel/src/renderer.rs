//! Conversation renderer.
//!
//! Turns inbound host messages into conversation turns and user actions
//! into outbound messages. The renderer owns the document and holds
//! explicit handles to the regions it mutates.
//!
//! State:
//! - input region: [`InputState::Visible`] until a submit, then
//!   [`InputState::Hidden`] until the host sends `reset`
//! - per yes/no pair: [`AnswerState::AwaitingAnswer`] until one control is
//!   activated, then [`AnswerState::Answered`] for good
//! - at most one feedback turn carries the running marker; every inbound
//!   message clears it before being handled

use crate::bridge::HostSender;
use crate::config::PanelConfig;
use crate::element::{element, Document, Element, NodeId, Tag};
use crate::protocol::{InboundMessage, InputKind, OutboundMessage, Severity};

/// Class names attached to conversation elements.
pub mod class {
    pub const TURN: &str = "turn";
    pub const FEEDBACK: &str = "feedback";
    pub const RUNNING: &str = "running";
    pub const YES_NO: &str = "yesno";
    pub const YES: &str = "yes";
    pub const NO: &str = "no";
    pub const SELECTED: &str = "selected";
    pub const DESELECTED: &str = "deselected";
}

/// Visibility of the input region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    /// Prompt and submit control shown.
    #[default]
    Visible,
    /// Suppressed after a submit, until the host resets.
    Hidden,
}

impl InputState {
    /// State after a submit click, `None` if the click is not possible.
    pub fn submit(self) -> Option<Self> {
        match self {
            Self::Visible => Some(Self::Hidden),
            Self::Hidden => None,
        }
    }
}

/// An answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Value sent to the host.
    pub fn as_bool(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// State of one yes/no pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    AwaitingAnswer,
    Answered(Answer),
}

impl AnswerState {
    /// State after activating a control, `None` once already answered.
    pub fn answer(self, answer: Answer) -> Option<Self> {
        match self {
            Self::AwaitingAnswer => Some(Self::Answered(answer)),
            Self::Answered(_) => None,
        }
    }
}

/// Identifier of a yes/no pair, unique for the renderer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairId(u64);

/// A rendered yes/no control pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YesNoPair {
    pub id: PairId,
    /// The turn holding both controls.
    pub turn: NodeId,
    pub yes: NodeId,
    pub no: NodeId,
    pub state: AnswerState,
}

/// Something the user did in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Replace the prompt text.
    EditPrompt(String),
    /// Click the submit control.
    Submit,
    /// Click one control of a yes/no pair.
    Answer { pair: PairId, answer: Answer },
    /// Click the retry control.
    Retry,
}

/// Outcome of a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The action changed state or sent a message.
    Applied,
    /// The action was not possible in the current state. Nothing was sent.
    Ignored,
}

/// Handles to the regions built by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub input: NodeId,
    pub prompt: NodeId,
    pub submit: NodeId,
    pub conversation: NodeId,
    pub footer: NodeId,
    pub retry: NodeId,
}

/// The conversation state machine.
#[derive(Debug)]
pub struct ConversationRenderer<S: HostSender> {
    document: Document,
    regions: Regions,
    sender: S,
    input: InputState,
    running: Option<NodeId>,
    pairs: Vec<YesNoPair>,
    next_pair: u64,
    yes_label: String,
    no_label: String,
}

impl<S: HostSender> ConversationRenderer<S> {
    /// Take ownership of a bootstrapped document.
    pub fn new(document: Document, regions: Regions, sender: S, config: &PanelConfig) -> Self {
        Self {
            document,
            regions,
            sender,
            input: InputState::Visible,
            running: None,
            pairs: Vec::new(),
            next_pair: 1,
            yes_label: config.yes_label.clone(),
            no_label: config.no_label.clone(),
        }
    }

    /// The rendered document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Region handles.
    pub fn regions(&self) -> Regions {
        self.regions
    }

    /// Current input region state.
    pub fn input_state(&self) -> InputState {
        self.input
    }

    /// Current prompt text.
    pub fn prompt_value(&self) -> &str {
        self.document
            .get(self.regions.prompt)
            .map_or("", |n| n.value.as_str())
    }

    /// The feedback turn currently marked running, if any.
    pub fn running_turn(&self) -> Option<NodeId> {
        self.running
    }

    /// Conversation turns in order.
    pub fn turns(&self) -> &[NodeId] {
        self.document.children(self.regions.conversation)
    }

    /// All yes/no pairs currently rendered, oldest first.
    pub fn pairs(&self) -> &[YesNoPair] {
        &self.pairs
    }

    /// Look up a pair.
    pub fn pair(&self, id: PairId) -> Option<&YesNoPair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    /// The most recent pair still awaiting an answer.
    pub fn pending_pair(&self) -> Option<PairId> {
        self.pairs
            .iter()
            .rev()
            .find(|p| p.state == AnswerState::AwaitingAnswer)
            .map(|p| p.id)
    }

    /// The outbound sink.
    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Mutable access to the outbound sink.
    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    /// Handle one inbound message.
    pub fn handle_inbound(&mut self, message: InboundMessage) {
        tracing::debug!(tag = message.tag(), "handling inbound message");
        self.clear_running();

        match message {
            InboundMessage::Input {
                kind: InputKind::YesNo,
                content,
            } => {
                self.append_turn(Severity::Assistance.as_str(), content);
                self.append_yes_no();
            }
            InboundMessage::Feedback { content } => {
                let turn = self.document.append(
                    self.regions.conversation,
                    element(
                        Tag::Div,
                        &[class::TURN, class::FEEDBACK, class::RUNNING],
                        None,
                        Vec::new(),
                    )
                    .content(content),
                );
                self.running = turn;
            }
            InboundMessage::Reset => self.reset(),
            InboundMessage::Line { severity, content } => {
                self.append_turn(severity.as_str(), content);
            }
        }
    }

    /// Handle one user action.
    pub fn handle_action(&mut self, action: UserAction) -> Handled {
        match action {
            UserAction::EditPrompt(text) => {
                if self.input == InputState::Hidden {
                    return Handled::Ignored;
                }
                self.document.set_value(self.regions.prompt, text);
                Handled::Applied
            }
            UserAction::Submit => self.submit(),
            UserAction::Answer { pair, answer } => self.answer(pair, answer),
            UserAction::Retry => {
                self.sender.send(OutboundMessage::Retry);
                Handled::Applied
            }
        }
    }

    fn submit(&mut self) -> Handled {
        let Some(next) = self.input.submit() else {
            tracing::debug!("submit ignored, input region hidden");
            return Handled::Ignored;
        };
        let prompt = self.prompt_value().to_string();
        self.sender.send(OutboundMessage::submit(prompt));
        self.document.set_hidden(self.regions.input, true);
        self.input = next;
        Handled::Applied
    }

    fn answer(&mut self, id: PairId, answer: Answer) -> Handled {
        let Some(pair) = self.pairs.iter_mut().find(|p| p.id == id) else {
            tracing::debug!(?id, "answer ignored, pair no longer rendered");
            return Handled::Ignored;
        };
        let Some(next) = pair.state.answer(answer) else {
            tracing::debug!(?id, "answer ignored, pair already answered");
            return Handled::Ignored;
        };
        pair.state = next;

        let (chosen, other) = match answer {
            Answer::Yes => (pair.yes, pair.no),
            Answer::No => (pair.no, pair.yes),
        };
        self.document.set_disabled(chosen, true);
        self.document.set_disabled(other, true);
        self.document.add_class(chosen, class::SELECTED);
        self.document.add_class(other, class::DESELECTED);

        self.sender.send(OutboundMessage::resume(answer.as_bool()));
        Handled::Applied
    }

    fn reset(&mut self) {
        self.sender.send(OutboundMessage::Reset);
        self.document.clear_children(self.regions.conversation);
        self.pairs.clear();
        self.running = None;
        self.document.set_value(self.regions.prompt, "");
        self.document.set_hidden(self.regions.input, false);
        self.input = InputState::Visible;
    }

    fn clear_running(&mut self) {
        if let Some(turn) = self.running.take() {
            self.document.remove_class(turn, class::RUNNING);
        }
    }

    fn append_turn(&mut self, kind: &str, content: String) {
        self.document.append(
            self.regions.conversation,
            element(Tag::Div, &[class::TURN, kind], None, Vec::new()).content(content),
        );
    }

    fn append_yes_no(&mut self) {
        let controls = element(
            Tag::Div,
            &[class::TURN, class::YES_NO],
            None,
            vec![
                Element::new(Tag::Button)
                    .class(class::YES)
                    .content(self.yes_label.as_str()),
                Element::new(Tag::Button)
                    .class(class::NO)
                    .content(self.no_label.as_str()),
            ],
        );
        let Some(turn) = self.document.append(self.regions.conversation, controls) else {
            return;
        };
        let &[yes, no] = self.document.children(turn) else {
            return;
        };

        let id = PairId(self.next_pair);
        self.next_pair += 1;
        self.pairs.push(YesNoPair {
            id,
            turn,
            yes,
            no,
            state: AnswerState::AwaitingAnswer,
        });
    }

    /// Plain-text rendition of the conversation, one entry per turn.
    pub fn transcript(&self) -> Vec<String> {
        self.turns()
            .iter()
            .filter_map(|&turn| self.describe_turn(turn))
            .collect()
    }

    fn describe_turn(&self, turn: NodeId) -> Option<String> {
        let node = self.document.get(turn)?;

        if node.has_class(class::YES_NO) {
            let pair = self.pairs.iter().find(|p| p.turn == turn)?;
            let state = match pair.state {
                AnswerState::AwaitingAnswer => format!("{} / {}", self.yes_label, self.no_label),
                AnswerState::Answered(Answer::Yes) => format!("answered {}", self.yes_label),
                AnswerState::Answered(Answer::No) => format!("answered {}", self.no_label),
            };
            return Some(format!("[yesno] {state}"));
        }

        let kind = if node.has_class(class::FEEDBACK) {
            class::FEEDBACK
        } else {
            Severity::ALL
                .into_iter()
                .find(|s| node.has_class(s.as_str()))
                .map_or("turn", Severity::as_str)
        };
        let content = node.content.as_deref().unwrap_or_default();
        let running = if node.has_class(class::RUNNING) {
            " (running)"
        } else {
            ""
        };
        Some(format!("[{kind}] {content}{running}"))
    }
}
