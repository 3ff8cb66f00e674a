#![warn(missing_docs)]
//! # qcm-resolver-ui
//!
//! ## Purpose
//! Holds the observable UI state of the client and projects it into
//! render-ready view models.
//!
//! ## Responsibilities
//! - Represent language, documents, context selection, and panel mode.
//! - Notify subscribers synchronously on every mutation.
//! - Keep the context selection consistent with the document list.
//! - Project state into sidebar, QCM card, and results view models.
//!
//! ## Data flow
//! App flows mutate [`StateStore`] -> subscribers observe the new
//! [`AppState`] -> the shell renders [`sidebar_view`], [`qcm_card_view`],
//! and [`results_view`] projections of the same snapshot.
//!
//! ## Ownership and lifetimes
//! The store owns all state values; projections return owned strings so the
//! shell never borrows from the store across a render.
//!
//! ## Error model
//! None. Mutators that would break invariants (selecting an unknown
//! document) are ignored instead of failing.
//!
//! ## Security and privacy notes
//! State carries document names and solver text only, never captured pixel
//! data.

use qcm_resolver_contract::{DocumentRef, SolveResult};
use qcm_resolver_i18n::{translate, translate_with, Language, MessageKey};

/// Which results panel is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// The submission form.
    #[default]
    Form,
    /// A request is in flight.
    Loading,
    /// The last request failed.
    Error,
    /// The last request produced an answer.
    Success,
}

/// Status line of the most recent document operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOpStatus {
    /// A document is being uploaded and ingested.
    Processing,
    /// The last upload succeeded.
    Added {
        /// Name of the uploaded file.
        file_name: String,
    },
    /// The last document operation failed.
    Failed {
        /// Localized failure message, fixed at transition time.
        message: String,
    },
}

/// Aggregate client state.
///
/// Invariant: every id in `selected_context_ids` names a document present in
/// `documents`. The store prunes the selection inside every mutation that
/// changes either side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    /// Display language.
    pub language: Language,
    /// Visible results panel.
    pub mode: UiMode,
    /// Progress message, localized when the loading transition happened.
    pub loading_message: String,
    /// Failure message, localized when the error transition happened.
    pub error_message: String,
    /// Cached copy of the backend document list.
    pub documents: Vec<DocumentRef>,
    /// Ids of the documents selected as answer context.
    pub selected_context_ids: Vec<String>,
    /// Result of the last successful solve.
    pub last_result: Option<SolveResult>,
    /// `true` while a live capture session runs.
    pub capturing: bool,
    /// `true` while the "select a context document" warning shows.
    pub context_warning: bool,
    /// Sidebar status line of the last document operation.
    pub document_status: Option<DocumentOpStatus>,
}

/// Observable state container.
///
/// Constructed explicitly and passed by reference; there is no ambient
/// global instance. Every mutator notifies all subscribers synchronously
/// before returning.
#[derive(Default)]
pub struct StateStore {
    state: AppState,
    listeners: Vec<Box<dyn Fn(&AppState)>>,
}

impl StateStore {
    /// Creates a store with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state snapshot.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Registers a listener invoked synchronously after every mutation.
    pub fn subscribe(&mut self, listener: impl Fn(&AppState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Switches the display language.
    pub fn set_language(&mut self, language: Language) {
        self.state.language = language;
        self.notify();
    }

    /// Replaces the cached document list, pruning stale selections.
    pub fn set_documents(&mut self, documents: Vec<DocumentRef>) {
        self.state.documents = documents;
        self.prune_selection();
        self.notify();
    }

    /// Toggles a document in or out of the context selection.
    ///
    /// Unknown ids are ignored. Selecting a document clears the context
    /// warning.
    pub fn toggle_context(&mut self, id: &str) {
        if let Some(position) = self
            .state
            .selected_context_ids
            .iter()
            .position(|selected| selected == id)
        {
            self.state.selected_context_ids.remove(position);
        } else {
            if !self.state.documents.iter().any(|document| document.id == id) {
                return;
            }
            self.state.selected_context_ids.push(id.to_string());
            self.state.context_warning = false;
        }
        self.notify();
    }

    /// Removes one id from the context selection, if present.
    pub fn remove_context(&mut self, id: &str) {
        self.state
            .selected_context_ids
            .retain(|selected| selected != id);
        self.notify();
    }

    /// Shows the submission form.
    pub fn set_mode_form(&mut self) {
        self.state.mode = UiMode::Form;
        self.notify();
    }

    /// Shows the loading panel with an already localized message.
    pub fn set_mode_loading(&mut self, message: impl Into<String>) {
        self.state.mode = UiMode::Loading;
        self.state.loading_message = message.into();
        self.notify();
    }

    /// Shows the error panel with an already localized message.
    pub fn set_mode_error(&mut self, message: impl Into<String>) {
        self.state.mode = UiMode::Error;
        self.state.error_message = message.into();
        self.notify();
    }

    /// Shows the success panel for `result`.
    pub fn set_mode_success(&mut self, result: SolveResult) {
        self.state.mode = UiMode::Success;
        self.state.last_result = Some(result);
        self.notify();
    }

    /// Mirrors the live capture session state.
    pub fn set_capturing(&mut self, capturing: bool) {
        self.state.capturing = capturing;
        self.notify();
    }

    /// Shows or clears the context warning.
    pub fn flag_context_warning(&mut self, warning: bool) {
        self.state.context_warning = warning;
        self.notify();
    }

    /// Sets or clears the sidebar document status line.
    pub fn set_document_status(&mut self, status: Option<DocumentOpStatus>) {
        self.state.document_status = status;
        self.notify();
    }

    /// Clears the QCM result and returns to the form.
    pub fn reset_qcm(&mut self) {
        self.state.mode = UiMode::Form;
        self.state.last_result = None;
        self.state.error_message.clear();
        self.state.loading_message.clear();
        self.notify();
    }

    fn prune_selection(&mut self) {
        let documents = &self.state.documents;
        self.state
            .selected_context_ids
            .retain(|selected| documents.iter().any(|document| &document.id == selected));
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.state);
        }
    }
}

/// One rendered document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    /// Document id, used for toggle and delete events.
    pub id: String,
    /// Display label.
    pub label: String,
    /// `true` when the document is selected as context.
    pub selected: bool,
    /// Localized tooltip of the delete affordance.
    pub delete_tooltip: String,
}

/// Rendered sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarView {
    /// Sidebar heading.
    pub title: String,
    /// Sidebar subheading.
    pub subtitle: String,
    /// Label of the upload affordance.
    pub drop_label: String,
    /// Hint explaining context selection.
    pub context_instruction: String,
    /// Document rows, in list order.
    pub rows: Vec<DocumentRow>,
    /// Localized placeholder shown instead of rows when the list is empty.
    pub empty_notice: Option<String>,
    /// Localized status line of the last document operation.
    pub status_line: Option<String>,
}

/// Projects the sidebar from one state snapshot.
pub fn sidebar_view(state: &AppState) -> SidebarView {
    let lang = state.language;
    let rows: Vec<DocumentRow> = state
        .documents
        .iter()
        .map(|document| DocumentRow {
            id: document.id.clone(),
            label: document.name.clone(),
            selected: state
                .selected_context_ids
                .iter()
                .any(|selected| selected == &document.id),
            delete_tooltip: translate(lang, MessageKey::DeleteTooltip).to_string(),
        })
        .collect();

    let empty_notice = rows
        .is_empty()
        .then(|| translate(lang, MessageKey::NoDocuments).to_string());

    let status_line = state.document_status.as_ref().map(|status| match status {
        DocumentOpStatus::Processing => translate(lang, MessageKey::ProcessingPdf).to_string(),
        DocumentOpStatus::Added {
            file_name,
        } => translate_with(lang, MessageKey::PdfAdded, &[("fileName", file_name)]),
        DocumentOpStatus::Failed {
            message,
        } => message.clone(),
    });

    SidebarView {
        title: translate(lang, MessageKey::SidebarTitle).to_string(),
        subtitle: translate(lang, MessageKey::SidebarSubtitle).to_string(),
        drop_label: translate(lang, MessageKey::PdfDropText).to_string(),
        context_instruction: translate(lang, MessageKey::ContextInstruction).to_string(),
        rows,
        empty_notice,
        status_line,
    }
}

/// Rendered QCM submission card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcmCardView {
    /// Card title.
    pub title: String,
    /// Card subtitle.
    pub subtitle: String,
    /// Step heading.
    pub step_title: String,
    /// Label of the image drop affordance.
    pub drop_label: String,
    /// Separator word between drop zone and capture button.
    pub or_label: String,
    /// Label of the live-capture button.
    pub capture_button_label: String,
    /// `true` while a live session runs; the shell swaps the drop zone for
    /// capture controls.
    pub capture_active: bool,
    /// Localized context warning line, when raised.
    pub context_warning: Option<String>,
    /// Language code of the highlighted language switch entry.
    pub active_language: &'static str,
}

/// Projects the QCM card from one state snapshot.
pub fn qcm_card_view(state: &AppState) -> QcmCardView {
    let lang = state.language;
    QcmCardView {
        title: translate(lang, MessageKey::Title).to_string(),
        subtitle: translate(lang, MessageKey::Subtitle).to_string(),
        step_title: translate(lang, MessageKey::Step2Title).to_string(),
        drop_label: translate(lang, MessageKey::QcmDropText).to_string(),
        or_label: translate(lang, MessageKey::Or).to_string(),
        capture_button_label: translate(lang, MessageKey::CaptureScreen).to_string(),
        capture_active: state.capturing,
        context_warning: state
            .context_warning
            .then(|| translate(lang, MessageKey::ContextWarning).to_string()),
        active_language: lang.code(),
    }
}

/// Rendered results panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    /// The form is visible; no panel content.
    Form,
    /// Progress panel.
    Loading {
        /// Message fixed at the loading transition.
        message: String,
    },
    /// Failure panel.
    Error {
        /// Localized heading.
        heading: String,
        /// Message fixed at the error transition.
        message: String,
        /// Retry button label.
        retry_label: String,
    },
    /// Answer panel.
    Success {
        /// Localized heading.
        heading: String,
        /// Label above the extracted question.
        question_label: String,
        /// Extracted question text.
        question: String,
        /// Label above the suggested answer.
        answer_label: String,
        /// Suggested answer text.
        answer: String,
        /// Toggle label revealing the retrieved context.
        context_toggle_label: String,
        /// Retrieved context text.
        context: String,
        /// Button returning to the form.
        start_over_label: String,
    },
}

/// Projects the results panel from one state snapshot.
///
/// `Success` without a stored result degrades to `Form`; the combination is
/// unreachable through store mutators but must not panic in a renderer.
pub fn results_view(state: &AppState) -> ResultsView {
    let lang = state.language;
    match state.mode {
        UiMode::Form => ResultsView::Form,
        UiMode::Loading => ResultsView::Loading {
            message: state.loading_message.clone(),
        },
        UiMode::Error => ResultsView::Error {
            heading: translate(lang, MessageKey::Error).to_string(),
            message: state.error_message.clone(),
            retry_label: translate(lang, MessageKey::Retry).to_string(),
        },
        UiMode::Success => match &state.last_result {
            None => ResultsView::Form,
            Some(result) => ResultsView::Success {
                heading: translate(lang, MessageKey::AnswerFound).to_string(),
                question_label: translate(lang, MessageKey::ExtractedQuestion).to_string(),
                question: result.extracted_question.clone(),
                answer_label: translate(lang, MessageKey::SuggestedAnswer).to_string(),
                answer: result.answer.clone(),
                context_toggle_label: translate(lang, MessageKey::ShowContext).to_string(),
                context: result.retrieved_context.clone(),
                start_over_label: translate(lang, MessageKey::StartOver).to_string(),
            },
        },
    }
}
