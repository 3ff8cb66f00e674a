#![warn(missing_docs)]
//! # qcm-resolver-i18n
//!
//! ## Purpose
//! Provides the English and French user-facing strings of the client and a
//! total lookup over them.
//!
//! ## Responsibilities
//! - Enumerate every user-facing message as a typed key.
//! - Resolve keys to static strings per language.
//! - Substitute `{{placeholder}}` markers in template messages.
//!
//! ## Data flow
//! View projections and flow code ask for localized strings at the moment a
//! state transition happens; the returned text is stored or rendered as-is.
//!
//! ## Ownership and lifetimes
//! Plain lookups return `&'static str`; only substitution allocates.
//!
//! ## Error model
//! None. Lookup is total by construction: every `(Language, MessageKey)`
//! pair has a compiled-in string.
//!
//! ## Security and privacy notes
//! Substituted values (file names, server error text) are interpolated
//! verbatim; rendering layers must treat the result as plain text.
//!
//! ## Example
//! ```rust
//! use qcm_resolver_i18n::{translate_with, Language, MessageKey};
//!
//! let line = translate_with(
//!     Language::En,
//!     MessageKey::PdfAdded,
//!     &[("fileName", "course.pdf")],
//! );
//! assert_eq!(line, "\"course.pdf\" added.");
//! ```

/// Display language of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// English (the default).
    #[default]
    En,
    /// French.
    Fr,
}

impl Language {
    /// Returns the two-letter language code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }

    /// Parses a two-letter language code, case-insensitively.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            _ => None,
        }
    }
}

/// Typed key for every user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    /// Window/page title.
    PageTitle,
    /// Sidebar heading.
    SidebarTitle,
    /// Sidebar subheading.
    SidebarSubtitle,
    /// Main card title.
    Title,
    /// Main card subtitle.
    Subtitle,
    /// Label of the document-upload affordance.
    PdfDropText,
    /// Hint explaining context selection.
    ContextInstruction,
    /// Heading of the question-submission card.
    Step2Title,
    /// Warning shown when no context document is selected.
    ContextWarning,
    /// Label of the question-image drop affordance.
    QcmDropText,
    /// Separator word between submission alternatives.
    Or,
    /// Label of the live-capture button.
    CaptureScreen,
    /// Placeholder shown when the document list is empty.
    NoDocuments,
    /// Generic progress label.
    Processing,
    /// Progress label while a document is being ingested.
    ProcessingPdf,
    /// Progress label while a question is being solved.
    SolvingQcm,
    /// Generic error heading.
    Error,
    /// Retry button label.
    Retry,
    /// Heading of the success panel.
    AnswerFound,
    /// Label above the extracted question text.
    ExtractedQuestion,
    /// Label above the suggested answer text.
    SuggestedAnswer,
    /// Toggle revealing the retrieved context.
    ShowContext,
    /// Button returning to the submission form.
    StartOver,
    /// Confirmation prompt before deleting a document.
    DeleteConfirm,
    /// Tooltip of the per-document delete affordance.
    DeleteTooltip,
    /// Error shown when the document list cannot be loaded.
    LoadingError,
    /// Status line after a document upload succeeds (`{{fileName}}`).
    PdfAdded,
    /// Status line after a document upload fails (`{{errorMessage}}`).
    PdfError,
    /// Alert shown when a document deletion fails.
    AlertError,
    /// Error shown when the platform cannot capture the screen.
    CaptureNotSupported,
    /// Log prefix for unexpected capture failures.
    CaptureGenericErrorLog,
    /// Error shown when screen-capture permission is refused.
    CapturePermissionDenied,
    /// Error template carrying a capture failure detail (`{{message}}`).
    CaptureErrorWithMessage,
    /// Instruction line of the crop overlay.
    CaptureInstructions,
    /// Confirm button label.
    Confirm,
    /// Cancel button label.
    Cancel,
    /// Inline notice when the crop selection is below the minimum size.
    SelectionTooSmall,
}

/// Resolves a message in the given language.
pub fn translate(lang: Language, key: MessageKey) -> &'static str {
    match lang {
        Language::En => english(key),
        Language::Fr => french(key),
    }
}

/// Resolves a message and substitutes `{{placeholder}}` markers.
///
/// # Semantics
/// Each `(placeholder, value)` pair replaces the first occurrence of its
/// marker; markers without a pair are left untouched.
pub fn translate_with(
    lang: Language,
    key: MessageKey,
    replacements: &[(&str, &str)],
) -> String {
    let mut text = translate(lang, key).to_string();
    for (placeholder, value) in replacements {
        let marker = format!("{{{{{placeholder}}}}}");
        text = text.replacen(&marker, value, 1);
    }
    text
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::PageTitle => "QCM Resolver",
        MessageKey::SidebarTitle => "Knowledge Base",
        MessageKey::SidebarSubtitle => "Add or select documents to use.",
        MessageKey::Title => "QCM Resolver",
        MessageKey::Subtitle => {
            "Upload your QCM to find the answer based on the selected context."
        }
        MessageKey::PdfDropText => "Add a PDF...",
        MessageKey::ContextInstruction => {
            "📋 Click on documents to select them as context"
        }
        MessageKey::Step2Title => "Upload QCM Screenshot",
        MessageKey::ContextWarning => {
            "⚠️ Please select at least one context document from the sidebar"
        }
        MessageKey::QcmDropText => "Drag & drop an image or click here",
        MessageKey::Or => "or",
        MessageKey::CaptureScreen => "Capture Screen",
        MessageKey::NoDocuments => "No documents in the database.",
        MessageKey::Processing => "Processing...",
        MessageKey::ProcessingPdf => "Analyzing document...",
        MessageKey::SolvingQcm => "Finding answer...",
        MessageKey::Error => "Error",
        MessageKey::Retry => "Retry",
        MessageKey::AnswerFound => "Answer Found",
        MessageKey::ExtractedQuestion => "Extracted Question:",
        MessageKey::SuggestedAnswer => "Suggested Answer:",
        MessageKey::ShowContext => "Show context used",
        MessageKey::StartOver => "Start Over",
        MessageKey::DeleteConfirm => "Are you sure you want to delete this document?",
        MessageKey::DeleteTooltip => "Delete",
        MessageKey::LoadingError => "Error loading documents.",
        MessageKey::PdfAdded => "\"{{fileName}}\" added.",
        MessageKey::PdfError => "Error: {{errorMessage}}",
        MessageKey::AlertError => "Error: Could not delete the document.",
        MessageKey::CaptureNotSupported => "Your platform does not support this feature.",
        MessageKey::CaptureGenericErrorLog => "Error during screen capture:",
        MessageKey::CapturePermissionDenied => {
            "Permission to capture the screen was denied."
        }
        MessageKey::CaptureErrorWithMessage => "Capture error: {{message}}",
        MessageKey::CaptureInstructions => {
            "Select the area to capture by dragging your mouse"
        }
        MessageKey::Confirm => "Confirm",
        MessageKey::Cancel => "Cancel",
        MessageKey::SelectionTooSmall => "Selection is too small",
    }
}

fn french(key: MessageKey) -> &'static str {
    match key {
        MessageKey::PageTitle => "QCM Resolver",
        MessageKey::SidebarTitle => "Base de Connaissances",
        MessageKey::SidebarSubtitle => "Ajoutez ou sélectionnez des documents à utiliser.",
        MessageKey::Title => "QCM Resolver",
        MessageKey::Subtitle => {
            "Uploadez votre QCM pour trouver la réponse basée sur le contexte sélectionné."
        }
        MessageKey::PdfDropText => "Ajouter un PDF...",
        MessageKey::ContextInstruction => {
            "📋 Cliquez sur les documents pour les sélectionner comme contexte"
        }
        MessageKey::Step2Title => "Uploadez la capture du QCM",
        MessageKey::ContextWarning => {
            "⚠️ Veuillez sélectionner au moins un document de contexte dans la barre latérale"
        }
        MessageKey::QcmDropText => "Glissez-déposez une image ou cliquez ici",
        MessageKey::Or => "ou",
        MessageKey::CaptureScreen => "Capturer l'écran",
        MessageKey::NoDocuments => "Aucun document dans la base.",
        MessageKey::Processing => "Traitement en cours...",
        MessageKey::ProcessingPdf => "Analyse du document...",
        MessageKey::SolvingQcm => "Recherche de la réponse...",
        MessageKey::Error => "Erreur",
        MessageKey::Retry => "Réessayer",
        MessageKey::AnswerFound => "Réponse Trouvée",
        MessageKey::ExtractedQuestion => "Question extraite :",
        MessageKey::SuggestedAnswer => "Réponse suggérée :",
        MessageKey::ShowContext => "Afficher le contexte utilisé",
        MessageKey::StartOver => "Recommencer",
        MessageKey::DeleteConfirm => "Êtes-vous sûr de vouloir supprimer ce document ?",
        MessageKey::DeleteTooltip => "Supprimer",
        MessageKey::LoadingError => "Erreur de chargement des documents.",
        MessageKey::PdfAdded => "\"{{fileName}}\" ajouté.",
        MessageKey::PdfError => "Erreur : {{errorMessage}}",
        MessageKey::AlertError => "Erreur: Impossible de supprimer le document.",
        MessageKey::CaptureNotSupported => {
            "Votre plateforme ne supporte pas cette fonctionnalité."
        }
        MessageKey::CaptureGenericErrorLog => "Erreur durant la capture d'écran :",
        MessageKey::CapturePermissionDenied => {
            "La permission de capturer l'écran a été refusée."
        }
        MessageKey::CaptureErrorWithMessage => "Erreur de capture : {{message}}",
        MessageKey::CaptureInstructions => {
            "Sélectionnez la zone à capturer en glissant votre souris"
        }
        MessageKey::Confirm => "Confirmer",
        MessageKey::Cancel => "Annuler",
        MessageKey::SelectionTooSmall => "Sélection trop petite",
    }
}
