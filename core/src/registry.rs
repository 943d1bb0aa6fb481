//! Component registries - label-keyed factory maps for interchangeable
//! component implementations.
//!
//! Each registry owns one slot of the task (e.g. `svs`, `feats_extract`) and
//! maps labels to constructor functions. The capability contract of a slot is
//! the trait object the constructors return, so the method-surface check is
//! static; registration only has to reject duplicate labels. Lookup on an
//! unknown label fails with a "no such choice" error that lists the
//! registered labels.

use crate::config::{Conf, OptionSpec};
use crate::error::{TaskError, TaskResult};

/// Constructor for one registered implementation.
///
/// `X` is slot-specific build context (e.g. resolved dimensions for the
/// synthesis network); slots without context use `()`.
pub type Constructor<C, X> = fn(&X, &Conf) -> TaskResult<C>;

/// A label-keyed collection of interchangeable component constructors.
#[derive(Debug, Clone)]
pub struct ComponentRegistry<C, X = ()> {
    slot: &'static str,
    entries: Vec<(&'static str, Constructor<C, X>)>,
    default: Option<&'static str>,
    optional: bool,
}

impl<C, X> ComponentRegistry<C, X> {
    /// Create an empty registry for a slot.
    ///
    /// `optional` slots may be left unselected; required slots must resolve
    /// to a label at assembly time.
    pub fn new(slot: &'static str, optional: bool) -> Self {
        Self {
            slot,
            entries: Vec::new(),
            default: None,
            optional,
        }
    }

    /// Register an implementation under a label.
    ///
    /// Labels are fixed at compile time; registering the same label twice is
    /// a programming error.
    pub fn register(mut self, label: &'static str, ctor: Constructor<C, X>) -> Self {
        assert!(
            !self.entries.iter().any(|(l, _)| *l == label),
            "duplicate label '{}' in {} registry",
            label,
            self.slot
        );
        self.entries.push((label, ctor));
        self
    }

    /// Set the default label, which must already be registered.
    pub fn with_default(mut self, label: &'static str) -> Self {
        assert!(
            self.entries.iter().any(|(l, _)| *l == label),
            "default label '{}' not registered in {} registry",
            label,
            self.slot
        );
        self.default = Some(label);
        self
    }

    /// Describe this slot for the configuration-surface listing.
    pub fn option_spec(&self, help: &str) -> OptionSpec {
        OptionSpec {
            name: self.slot,
            default: self.default.unwrap_or("").to_string(),
            help: format!("{} (choose from: {})", help, self.labels().join(", ")),
            required: !self.optional && self.default.is_none(),
        }
    }

    /// All registered labels, in registration order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(l, _)| *l).collect()
    }

    /// Look up the constructor for a label.
    pub fn get(&self, label: &str) -> TaskResult<Constructor<C, X>> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, ctor)| *ctor)
            .ok_or_else(|| TaskError::unknown_choice(self.slot, label, &self.labels()))
    }

    /// Construct the implementation registered under `label`.
    pub fn build(&self, label: &str, ctx: &X, conf: &Conf) -> TaskResult<C> {
        let ctor = self.get(label)?;
        ctor(ctx, conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::empty_conf;

    fn make_a(_: &(), _: &Conf) -> TaskResult<&'static str> {
        Ok("a")
    }

    fn make_b(_: &(), _: &Conf) -> TaskResult<&'static str> {
        Ok("b")
    }

    fn registry() -> ComponentRegistry<&'static str> {
        ComponentRegistry::new("letter", false)
            .register("a", make_a)
            .register("b", make_b)
            .with_default("a")
    }

    #[test]
    fn test_build_by_label() {
        let reg = registry();
        assert_eq!(reg.build("b", &(), &empty_conf()).unwrap(), "b");
    }

    #[test]
    fn test_unknown_label_lists_choices() {
        let reg = registry();
        let err = reg.build("c", &(), &empty_conf()).unwrap_err();
        assert!(matches!(err, TaskError::UnknownChoice { .. }));
        assert_eq!(
            err.to_string(),
            "No such letter choice: 'c' (choose from: a, b)"
        );
    }

    #[test]
    fn test_option_spec_reports_labels_and_default() {
        let spec = registry().option_spec("Letter picker");
        assert_eq!(spec.name, "letter");
        assert_eq!(spec.default, "a");
        assert_eq!(spec.help, "Letter picker (choose from: a, b)");
        assert!(!spec.required);
    }

    #[test]
    #[should_panic(expected = "duplicate label")]
    fn test_duplicate_label_rejected_at_registration() {
        let _ = ComponentRegistry::new("letter", false)
            .register("a", make_a)
            .register("a", make_b);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_default_must_be_registered() {
        let _ = ComponentRegistry::new("letter", false)
            .register("a", make_a)
            .with_default("z");
    }
}
