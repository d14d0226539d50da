//! Field validation and inline feedback
//!
//! A validator is a plain function from the field's text to a
//! [`ValidationResult`]. [`validate_form`] checks a whole form at submit
//! time; [`FieldValidator`] gives live feedback while the user types, with
//! keystrokes debounced and `change`/`blur` checked immediately.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::models::split_tags;
use crate::view::intent::Intent;
use crate::view::listeners::{EventContext, EventKind, ListenerTracker};
use crate::view::node::Node;

/// Class of the inline message node
pub const MESSAGE_CLASS: &str = "validation-message";

/// Attribute set on a field while its value is rejected
pub const INVALID_ATTR: &str = "aria-invalid";

/// Outcome of validating one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

pub type ValidatorFn = Arc<dyn Fn(&str) -> ValidationResult + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Stock validators
// ─────────────────────────────────────────────────────────────────────────────

/// Rejects blank input
pub fn required() -> ValidatorFn {
    Arc::new(|value: &str| {
        if value.trim().is_empty() {
            ValidationResult::invalid("This field is required.")
        } else {
            ValidationResult::valid()
        }
    })
}

/// Rejects input longer than `max` characters
pub fn max_length(max: usize) -> ValidatorFn {
    Arc::new(move |value: &str| {
        if value.chars().count() > max {
            ValidationResult::invalid(format!("Must be at most {} characters.", max))
        } else {
            ValidationResult::valid()
        }
    })
}

/// Accepts a whole number within `min..=max`
pub fn int_range(min: i64, max: i64) -> ValidatorFn {
    Arc::new(move |value: &str| match value.trim().parse::<i64>() {
        Ok(n) if (min..=max).contains(&n) => ValidationResult::valid(),
        Ok(_) => ValidationResult::invalid(format!("Must be between {} and {}.", min, max)),
        Err(_) => ValidationResult::invalid("Enter a whole number."),
    })
}

/// Accepts up to `max_tags` comma separated tags of at most `max_tag_len` characters
pub fn tag_list(max_tags: usize, max_tag_len: usize) -> ValidatorFn {
    Arc::new(move |value: &str| {
        let tags = split_tags(value);
        if tags.len() > max_tags {
            return ValidationResult::invalid(format!("Use at most {} tags.", max_tags));
        }
        match tags.iter().find(|t| t.chars().count() > max_tag_len) {
            Some(tag) => ValidationResult::invalid(format!(
                "\"{}\" is longer than {} characters.",
                tag, max_tag_len
            )),
            None => ValidationResult::valid(),
        }
    })
}

/// Run validators in order, stopping at the first rejection
pub fn all_of(validators: Vec<ValidatorFn>) -> ValidatorFn {
    Arc::new(move |value: &str| {
        validators
            .iter()
            .map(|v| v(value))
            .find(|r| !r.is_valid)
            .unwrap_or_else(ValidationResult::valid)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Whole-form validation
// ─────────────────────────────────────────────────────────────────────────────

/// One field of a form submission
#[derive(Clone)]
pub struct FieldRule {
    /// Name used in messages
    pub field: String,
    pub value: String,
    pub validator: ValidatorFn,
    pub required: bool,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, value: impl Into<String>, validator: ValidatorFn) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            validator,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Result of [`validate_form`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValidation {
    pub is_valid: bool,
    /// Per-field results, in rule order
    pub results: Vec<(String, ValidationResult)>,
}

impl FormValidation {
    /// First rejection message, prefixed with the field name
    pub fn first_error(&self) -> Option<String> {
        self.results.iter().find(|(_, r)| !r.is_valid).map(|(field, r)| {
            format!(
                "{}: {}",
                field,
                r.message.as_deref().unwrap_or("invalid value")
            )
        })
    }
}

/// Validate every rule
///
/// A required field with a blank value is rejected without running its
/// validator; otherwise the validator's result is reported as is.
pub fn validate_form(rules: &[FieldRule]) -> FormValidation {
    let results: Vec<(String, ValidationResult)> = rules
        .iter()
        .map(|rule| {
            let result = if rule.required && rule.value.trim().is_empty() {
                ValidationResult::invalid("This field is required.")
            } else {
                (rule.validator)(&rule.value)
            };
            (rule.field.clone(), result)
        })
        .collect();

    FormValidation {
        is_valid: results.iter().all(|(_, r)| r.is_valid),
        results,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Live field validation
// ─────────────────────────────────────────────────────────────────────────────

/// A debounced validation result, delivered to the UI loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub field_id: String,
    pub result: ValidationResult,
}

/// Live validation for one field
///
/// `input` events restart a timer; when it expires the validator runs once
/// on the latest value and the outcome is sent over the channel. `change`
/// and `blur` cancel the timer and validate right away.
pub struct FieldValidator {
    field_id: String,
    validator: ValidatorFn,
    delay: Duration,
    tx: mpsc::Sender<ValidationOutcome>,
    pending: RefCell<Option<JoinHandle<()>>>,
}

impl FieldValidator {
    pub fn new(
        field_id: impl Into<String>,
        validator: ValidatorFn,
        delay: Duration,
        tx: mpsc::Sender<ValidationOutcome>,
    ) -> Rc<Self> {
        Rc::new(Self {
            field_id: field_id.into(),
            validator,
            delay,
            tx,
            pending: RefCell::new(None),
        })
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    /// Restart the quiet period with a new value
    pub fn schedule(&self, value: String) {
        self.cancel();

        let field_id = self.field_id.clone();
        let validator = Arc::clone(&self.validator);
        let delay = self.delay;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = validator(&value);
            let _ = tx.send(ValidationOutcome { field_id, result }).await;
        });
        *self.pending.borrow_mut() = Some(handle);
    }

    /// Drop a pending debounced run
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.borrow_mut().take() {
            handle.abort();
        }
    }

    /// Validate immediately, cancelling any pending run
    pub fn validate_now(&self, value: &str) -> ValidationResult {
        self.cancel();
        (self.validator)(value)
    }

    /// Register input, change and blur handlers on `field`
    pub fn attach(self: &Rc<Self>, tracker: &mut ListenerTracker, field: &mut Node) {
        let on_input = Rc::clone(self);
        tracker.add(
            field,
            EventKind::Input,
            Rc::new(move |ctx: &mut EventContext<'_>| {
                on_input.schedule(ctx.event.value.clone());
            }),
        );

        for kind in [EventKind::Change, EventKind::Blur] {
            let me = Rc::clone(self);
            tracker.add(
                field,
                kind,
                Rc::new(move |ctx: &mut EventContext<'_>| {
                    let result = me.validate_now(&ctx.event.value);
                    ctx.emit(Intent::FieldValidated {
                        field_id: me.field_id.clone(),
                        result,
                    });
                }),
            );
        }
    }
}

impl Drop for FieldValidator {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline messages
// ─────────────────────────────────────────────────────────────────────────────

/// Id of the message node for a field
pub fn message_id(field_id: &str) -> String {
    format!("{}-validation", field_id)
}

/// Show `message` right after the field's `form-group` (or the field itself)
///
/// Returns false when the field is not in the tree.
pub fn show_field_message(root: &mut Node, field_id: &str, message: &str) -> bool {
    hide_field_message(root, field_id);

    let Some(path) = root.path_to(field_id) else {
        return false;
    };
    let Some(chain) = root.chain(&path) else {
        return false;
    };
    // chain[k] sits at path[..k]
    let anchor = (1..chain.len())
        .rev()
        .find(|&k| chain[k].has_class("form-group"))
        .unwrap_or(chain.len() - 1);
    if anchor == 0 {
        return false;
    }

    let parent_path = &path[..anchor - 1];
    let index = path[anchor - 1];
    let node = Node::paragraph(message)
        .with_id(message_id(field_id))
        .with_class(MESSAGE_CLASS);

    match root.at_path_mut(parent_path) {
        Some(parent) => {
            parent.children.insert(index + 1, node);
            if let Some(field) = root.find_by_id_mut(field_id) {
                field.attrs.insert(INVALID_ATTR.to_string(), "true".to_string());
            }
            true
        }
        None => false,
    }
}

/// Remove the message for a field, if shown
pub fn hide_field_message(root: &mut Node, field_id: &str) {
    root.remove_by_id(&message_id(field_id));
    if let Some(field) = root.find_by_id_mut(field_id) {
        field.attrs.remove(INVALID_ATTR);
    }
}

/// Show or hide the inline message to match `result`
pub fn apply_result(root: &mut Node, field_id: &str, result: &ValidationResult) {
    if result.is_valid {
        hide_field_message(root, field_id);
    } else {
        let message = result.message.as_deref().unwrap_or("Invalid value.");
        show_field_message(root, field_id, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::listeners::UiEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counting(calls: Arc<AtomicUsize>, seen: Arc<Mutex<Vec<String>>>) -> ValidatorFn {
        Arc::new(move |value: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(value.to_string());
            if value.len() > 3 {
                ValidationResult::invalid("too long")
            } else {
                ValidationResult::valid()
            }
        })
    }

    #[test]
    fn test_required_blank_skips_validator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let rules = vec![FieldRule::new("Name", "   ", counting(calls.clone(), seen)).required()];

        let form = validate_form(&rules);

        assert!(!form.is_valid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            form.first_error().as_deref(),
            Some("Name: This field is required.")
        );
    }

    #[test]
    fn test_validator_result_is_surfaced_unchanged() {
        let custom: ValidatorFn =
            Arc::new(|_: &str| ValidationResult::invalid("Pick another title"));
        let rules = vec![
            FieldRule::new("Title", "Dawn", custom).required(),
            FieldRule::new("Genre", "", max_length(10)),
        ];

        let form = validate_form(&rules);

        assert!(!form.is_valid);
        assert_eq!(form.results[0].1, ValidationResult::invalid("Pick another title"));
        assert_eq!(form.results[1].1, ValidationResult::valid());
    }

    #[test]
    fn test_stock_validators() {
        assert!(!required()("  ").is_valid);
        assert!(max_length(3)("abc").is_valid);
        assert!(!max_length(3)("abcd").is_valid);
        assert!(int_range(1, 50)("10").is_valid);
        assert!(!int_range(1, 50)("0").is_valid);
        assert_eq!(
            int_range(1, 50)("ten").message.as_deref(),
            Some("Enter a whole number.")
        );
        assert!(tag_list(2, 5)("brave, kind").is_valid);
        assert!(!tag_list(2, 5)("a, b, c").is_valid);
        assert!(!tag_list(2, 5)("courageous").is_valid);
        assert!(!all_of(vec![required(), max_length(2)])("abc").is_valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_validates_once_with_latest_value() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let validator = FieldValidator::new(
            "card-name",
            counting(calls.clone(), seen.clone()),
            Duration::from_millis(300),
            tx,
        );

        validator.schedule("A".into());
        tokio::time::advance(Duration::from_millis(100)).await;
        validator.schedule("Ar".into());
        tokio::time::advance(Duration::from_millis(100)).await;
        validator.schedule("Aria".into());

        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.field_id, "card-name");
        assert_eq!(outcome.result, ValidationResult::invalid("too long"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["Aria".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_validates_now_and_cancels_pending() {
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let validator = FieldValidator::new(
            "title",
            counting(calls.clone(), seen),
            Duration::from_millis(300),
            tx,
        );

        let mut tracker = ListenerTracker::new();
        let mut field = Node::input("title", "Title", "");
        validator.attach(&mut tracker, &mut field);
        let root = Node::div().with_child(field);

        let typed = tracker.dispatch(
            &root,
            &UiEvent::new(EventKind::Input, "title").with_value("Dusk"),
        );
        assert!(typed.is_empty());

        let intents = tracker.dispatch(
            &root,
            &UiEvent::new(EventKind::Blur, "title").with_value("Dusk"),
        );
        assert_eq!(
            intents,
            vec![Intent::FieldValidated {
                field_id: "title".into(),
                result: ValidationResult::invalid("too long"),
            }]
        );

        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_message_inserted_after_form_group() {
        let mut root = Node::div().with_id("form").with_children([
            Node::form_group(Node::input("name", "Name", "")),
            Node::button("save", "Save"),
        ]);

        assert!(show_field_message(&mut root, "name", "Name is required."));
        assert_eq!(root.children[1].id.as_deref(), Some("name-validation"));
        assert_eq!(root.children[1].text, "Name is required.");
        assert_eq!(
            root.find_by_id("name").unwrap().attr(INVALID_ATTR),
            Some("true")
        );

        // Showing again replaces rather than stacks
        show_field_message(&mut root, "name", "Still required.");
        assert_eq!(root.children.len(), 3);

        apply_result(&mut root, "name", &ValidationResult::valid());
        assert!(root.find_by_id("name-validation").is_none());
        assert!(root.find_by_id("name").unwrap().attr(INVALID_ATTR).is_none());
    }

    #[test]
    fn test_message_without_form_group_follows_field() {
        let mut root = Node::div().with_child(Node::input("count", "Count", "x"));
        assert!(show_field_message(&mut root, "count", "Enter a whole number."));
        assert_eq!(root.children[1].id.as_deref(), Some("count-validation"));
    }
}
