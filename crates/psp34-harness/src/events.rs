//! Event assertions over call outcomes

use std::collections::BTreeMap;

use crate::outcome::{CallOutcome, EventRecord};
use crate::value::Value;
use crate::{HarnessError, HarnessResult};

/// Expected event arguments
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventArgs(BTreeMap<String, Value>);

impl EventArgs {
    /// Empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Arguments with wrapped integers collapsed
    pub fn normalized(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.normalized()))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for EventArgs {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

fn render(args: &BTreeMap<String, Value>) -> String {
    Value::Map(args.clone()).to_string()
}

/// First event named `name`
pub fn find_event<'a>(outcome: &'a CallOutcome, name: &str) -> Option<&'a EventRecord> {
    outcome.events.iter().find(|e| e.name == name)
}

/// Every event named `name`, in emission order
pub fn events_named<'a>(outcome: &'a CallOutcome, name: &str) -> Vec<&'a EventRecord> {
    outcome.events.iter().filter(|e| e.name == name).collect()
}

/// Assert the first event named `name` carries exactly `expected`
///
/// Both sides are normalized before comparison; extra or missing keys
/// are a mismatch.
pub fn assert_event<'a>(
    outcome: &'a CallOutcome,
    name: &str,
    expected: &EventArgs,
) -> HarnessResult<&'a EventRecord> {
    let record = find_event(outcome, name).ok_or_else(|| HarnessError::EventNotFound {
        name: name.to_string(),
        available: outcome.event_names(),
    })?;

    let actual = record.normalized_args();
    let expected = expected.normalized();
    if actual != expected {
        return Err(HarnessError::AssertionMismatch {
            subject: format!("{} event", name),
            expected: render(&expected),
            actual: render(&actual),
        });
    }
    Ok(record)
}

/// Assert no event named `name` was emitted
pub fn assert_no_event(outcome: &CallOutcome, name: &str) -> HarnessResult<()> {
    match find_event(outcome, name) {
        None => Ok(()),
        Some(record) => Err(HarnessError::AssertionMismatch {
            subject: format!("{} event", name),
            expected: "no event".to_string(),
            actual: render(&record.args),
        }),
    }
}

/// Assertion helpers on [`CallOutcome`]
pub trait OutcomeAssertions {
    /// See [`assert_event`]
    fn assert_event(&self, name: &str, expected: &EventArgs) -> HarnessResult<&EventRecord>;

    /// Assert the call succeeded and return its value
    fn assert_ok(&self) -> HarnessResult<&Value>;

    /// Assert the call was rejected with the given identifier
    fn assert_rejected_with(&self, identifier: &str) -> HarnessResult<()>;

    /// Assert exactly `count` events named `name` were emitted
    fn assert_event_count(&self, name: &str, count: usize) -> HarnessResult<()>;
}

impl OutcomeAssertions for CallOutcome {
    fn assert_event(&self, name: &str, expected: &EventArgs) -> HarnessResult<&EventRecord> {
        assert_event(self, name, expected)
    }

    fn assert_ok(&self) -> HarnessResult<&Value> {
        match &self.result {
            Ok(value) => Ok(value),
            Err(err) => Err(HarnessError::UnexpectedDomainError {
                message: self.message.clone(),
                identifier: err.to_string(),
            }),
        }
    }

    fn assert_rejected_with(&self, identifier: &str) -> HarnessResult<()> {
        let actual = match &self.result {
            Ok(value) => format!("success {}", value),
            Err(err) => {
                let decoded = err.identifier()?;
                if decoded == identifier {
                    return Ok(());
                }
                decoded
            }
        };
        Err(HarnessError::AssertionMismatch {
            subject: format!("{} error", self.message),
            expected: identifier.to_string(),
            actual,
        })
    }

    fn assert_event_count(&self, name: &str, count: usize) -> HarnessResult<()> {
        let actual = events_named(self, name).len();
        if actual != count {
            return Err(HarnessError::AssertionMismatch {
                subject: format!("{} event count", name),
                expected: count.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_decoder;
    use crate::outcome::ContractError;
    use psp34_primitives::Id;

    fn transfer_event(to: &str, id: u64) -> EventRecord {
        let mut args = BTreeMap::new();
        args.insert("from".to_string(), Value::Null);
        args.insert("to".to_string(), Value::from(to));
        args.insert("id".to_string(), Value::Id(Id::U64(id)));
        EventRecord {
            name: "Transfer".to_string(),
            args,
        }
    }

    fn outcome(events: Vec<EventRecord>) -> CallOutcome {
        CallOutcome {
            message: "mintNext".to_string(),
            result: Ok(Value::Null),
            gas_required: 10,
            gas_consumed: 10,
            events,
            block_hash: None,
        }
    }

    #[test]
    fn test_assert_event_matches_first() {
        let outcome = outcome(vec![transfer_event("0xaa", 1), transfer_event("0xbb", 2)]);
        let expected = EventArgs::new()
            .with("from", Value::Null)
            .with("to", "0xaa")
            .with("id", Id::U64(1));
        assert!(assert_event(&outcome, "Transfer", &expected).is_ok());
    }

    #[test]
    fn test_assert_event_not_found() {
        let outcome = outcome(vec![]);
        match assert_event(&outcome, "Transfer", &EventArgs::new()) {
            Err(HarnessError::EventNotFound { name, available }) => {
                assert_eq!(name, "Transfer");
                assert!(available.is_empty());
            }
            other => panic!("Expected EventNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_assert_event_extra_key_is_mismatch() {
        let outcome = outcome(vec![transfer_event("0xaa", 1)]);
        let expected = EventArgs::new().with("to", "0xaa").with("id", Id::U64(1));
        assert!(matches!(
            assert_event(&outcome, "Transfer", &expected),
            Err(HarnessError::AssertionMismatch { .. })
        ));
    }

    #[test]
    fn test_assert_event_normalizes_wrapped() {
        let mut args = BTreeMap::new();
        args.insert("amount".to_string(), Value::wrapped(5u64));
        let outcome = outcome(vec![EventRecord {
            name: "Paid".to_string(),
            args,
        }]);
        let expected = EventArgs::new().with("amount", 5u64);
        assert!(outcome.assert_event("Paid", &expected).is_ok());
    }

    #[test]
    fn test_assert_no_event() {
        let outcome = outcome(vec![transfer_event("0xaa", 1)]);
        assert!(assert_no_event(&outcome, "Approval").is_ok());
        assert!(assert_no_event(&outcome, "Transfer").is_err());
    }

    #[test]
    fn test_assert_rejected_with() {
        let mut rejected = outcome(vec![]);
        rejected.result = Err(ContractError::Custom(error_decoder::encode("MintEnd")));
        assert!(rejected.assert_rejected_with("MintEnd").is_ok());
        assert!(rejected.assert_rejected_with("CollectionIsFull").is_err());
        assert!(rejected.assert_ok().is_err());

        let accepted = outcome(vec![transfer_event("0xaa", 1)]);
        assert!(accepted.assert_rejected_with("MintEnd").is_err());
        assert!(accepted.assert_event_count("Transfer", 1).is_ok());
    }
}
